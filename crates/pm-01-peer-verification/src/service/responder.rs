//! Responder side: decrypt the challenge and echo it.

use super::core::PeerVerificationService;
use crate::domain::VerificationError;
use shared_types::PeerId;
use std::slice;
use tracing::{debug, error};

impl PeerVerificationService {
    /// Decrypt a challenge from `sender` and send the plaintext back.
    ///
    /// A challenge that cannot be decrypted is logged and dropped. The
    /// initiator learns nothing and eventually times out.
    ///
    /// # Errors
    ///
    /// `Action` if the echo cannot be sent.
    pub(crate) async fn handle_encrypted_token(
        &self,
        ciphertext: Vec<u8>,
        sender: PeerId,
    ) -> Result<(), VerificationError> {
        let token = match self
            .ports
            .encryption
            .decrypt_string(&self.private_key, &ciphertext)
            .await
        {
            Ok(token) => token,
            Err(source) => {
                let err = VerificationError::DecryptionFailed {
                    peer_id: sender,
                    source,
                };
                error!(error = %err, "Verification challenge dropped");
                return Ok(());
            }
        };

        self.send_raw
            .send(&token, Some(slice::from_ref(&sender)))
            .await?;
        debug!(peer_id = %sender, "Verification token echoed");
        Ok(())
    }
}
