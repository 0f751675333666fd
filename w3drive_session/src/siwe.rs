use alloy_primitives::Address;

use crate::keys::drive_id;

/// The sign-in message the wallet signs to seed the drive key.
///
/// Everything in it is a pure function of its inputs, so the wallet returns
/// the same signature for the same account and chain every time.
pub fn sign_in_message(domain: &str, address: &Address, chain_id: u64) -> String {
    let nonce = drive_id(address);
    let address = address.to_checksum(None);
    // The indented blank lines are part of the signed text.
    format!(
        concat!(
            "{domain} wants you to sign in with your Ethereum account:\n",
            "        \n",
            "{address}\n",
            "\n",
            "I accept the MetaMask Terms of Service: https://community.metamask.io/tos\n",
            "        \n",
            "\n",
            "URI: https://{domain}\n",
            "Version: 1\n",
            "Chain ID: {chain_id}\n",
            "Nonce: {nonce}",
        ),
        domain = domain,
        address = address,
        chain_id = chain_id,
        nonce = nonce,
    )
}
