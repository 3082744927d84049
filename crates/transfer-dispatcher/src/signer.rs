use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;

use crate::error::DispatchError;
use crate::types::{Credential, RecipientAddress};

/// A credential bound to the chain id of the selected endpoint.
#[derive(Debug, Clone)]
pub struct SignerIdentity {
    wallet: LocalWallet,
}

impl SignerIdentity {
    pub fn new(credential: &Credential, chain_id: u64) -> Self {
        Self {
            wallet: credential.wallet(chain_id),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

/// One signer per credential, in credential order.
#[derive(Debug, Clone)]
pub struct SignerPool {
    signers: Vec<SignerIdentity>,
}

impl SignerPool {
    /// # Errors
    ///
    /// `DispatchError::NoValidCredentials` when `credentials` is empty.
    pub fn new(credentials: &[Credential], chain_id: u64) -> Result<Self, DispatchError> {
        if credentials.is_empty() {
            return Err(DispatchError::NoValidCredentials);
        }
        let signers = credentials
            .iter()
            .map(|credential| SignerIdentity::new(credential, chain_id))
            .collect();
        Ok(Self { signers })
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn signers(&self) -> &[SignerIdentity] {
        &self.signers
    }

    /// The signer assigned to the recipient at `recipient_index`.
    pub fn signer_for(&self, recipient_index: usize) -> Result<&SignerIdentity, DispatchError> {
        let index = assign(recipient_index, self.signers.len())?;
        Ok(&self.signers[index])
    }
}

/// Round-robin assignment: recipient `i` is served by signer `i mod signer_count`.
pub fn assign(recipient_index: usize, signer_count: usize) -> Result<usize, DispatchError> {
    if signer_count == 0 {
        return Err(DispatchError::NoValidCredentials);
    }
    Ok(recipient_index % signer_count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    /// One-based position in the recipient list.
    pub position: usize,
    pub signer: Address,
    pub recipient: RecipientAddress,
}

/// The first rows of the signer → recipient mapping, shown before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub rows: Vec<PreviewRow>,
    /// Recipients not listed in `rows`.
    pub remaining: usize,
}

pub fn preview(
    pool: &SignerPool,
    recipients: &[RecipientAddress],
    limit: usize,
) -> Result<Preview, DispatchError> {
    let rows = recipients
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, recipient)| {
            Ok(PreviewRow {
                position: index + 1,
                signer: pool.signer_for(index)?.address(),
                recipient: *recipient,
            })
        })
        .collect::<Result<Vec<_>, DispatchError>>()?;
    Ok(Preview {
        remaining: recipients.len().saturating_sub(rows.len()),
        rows,
    })
}
