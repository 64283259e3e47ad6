//! Sparsity placement modes
//!
//! A mode names which of the three matrices in `C = op(A) · op(B)` is
//! block-sparse. It is parsed once at the boundary into a closed enum and
//! dispatched once per call.

use blocksparse_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage kind of one matrix in a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Dense,
    Sparse,
}

impl Operand {
    fn letter(self) -> char {
        match self {
            Operand::Dense => 'd',
            Operand::Sparse => 's',
        }
    }
}

/// Which matrix of `C = op(A) · op(B)` is block-sparse
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// dense × dense → sparse: only the listed output tiles are computed
    Sdd,
    /// sparse × dense → dense
    Dsd,
    /// dense × sparse → dense
    Dds,
}

impl Mode {
    /// All supported modes
    pub const ALL: [Mode; 3] = [Mode::Sdd, Mode::Dsd, Mode::Dds];

    /// Kinds of `[C, A, B]`
    pub fn operands(self) -> [Operand; 3] {
        use Operand::{Dense as D, Sparse as S};
        match self {
            Mode::Sdd => [S, D, D],
            Mode::Dsd => [D, S, D],
            Mode::Dds => [D, D, S],
        }
    }

    /// Mode whose `[C, A, B]` kinds are `kinds`
    ///
    /// Exactly one sparse matrix is supported.
    pub fn from_operands(kinds: [Operand; 3]) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.operands() == kinds)
            .ok_or_else(|| {
                Error::UnsupportedMode(kinds.iter().map(|k| k.letter()).collect())
            })
    }

    /// Mode built from this mode's kinds reordered by `order`
    ///
    /// `order` indexes `[C, A, B]`; `[1, 0, 2]` swaps the roles of C and A.
    pub fn permuted(self, order: [usize; 3]) -> Result<Self> {
        let kinds = self.operands();
        Self::from_operands(order.map(|i| kinds[i]))
    }

    /// Lowercase name, e.g. `"dsd"`
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Sdd => "sdd",
            Mode::Dsd => "dsd",
            Mode::Dds => "dds",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sdd" => Ok(Mode::Sdd),
            "dsd" => Ok(Mode::Dsd),
            "dds" => Ok(Mode::Dds),
            other => Err(Error::UnsupportedMode(format!(
                "{other:?} (expected one of sdd, dsd, dds)"
            ))),
        }
    }
}
