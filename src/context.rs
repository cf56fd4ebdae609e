//! Identity and sequencing context supplied by the host for every call
use super::error::LedgerError;
use bech32::Bech32m;
use std::fmt;
use uuid7::uuid7;

/// An authenticated identity, held as a bech32 address string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Principal(String);

impl Principal {
    /// Accepts any well-formed bech32 or bech32m address. bech32 is case
    /// insensitive, so the address is held lowercased and an all-uppercase
    /// spelling names the same principal.
    pub fn parse(address: &str) -> Result<Self, LedgerError> {
        bech32::decode(address).map_err(|e| {
            LedgerError::InvalidParameter(format!("principal {address:?} is not bech32: {e}"))
        })?;
        Ok(Self(address.to_ascii_lowercase()))
    }

    /// Mint a fresh principal under the given human readable part.
    pub fn generate(hrp: &str) -> Result<Self, LedgerError> {
        let hrp = bech32::Hrp::parse(hrp)
            .map_err(|e| LedgerError::InvalidParameter(format!("hrp {hrp:?}: {e}")))?;
        let address = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
            .map_err(|e| LedgerError::InvalidParameter(e.to_string()))?;
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<C> minicbor::Encode<C> for Principal {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Principal {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Principal(d.str()?.to_string()))
    }
}

/// Who is calling, and the host's logical clock at the time of the call.
///
/// The ledger trusts both values as given. The host is expected to process
/// calls one at a time, in a total order, and to hand out a clock value that
/// never goes backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Principal,
    pub clock: u64,
}

impl CallContext {
    pub fn new(caller: Principal, clock: u64) -> Self {
        Self { caller, clock }
    }
}
