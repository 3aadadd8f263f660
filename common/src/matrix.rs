//! The closed schema of a benchmark run: which workloads, file modes,
//! libraries, operations and trials exist, and the order they are plotted in.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Declares a fieldless enum whose variants carry a fixed label. The variant
/// order is the plotting order, exposed through `ALL` and `index()`.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Position in [`Self::ALL`]
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = ReportError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|x| x.label().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ReportError::UnknownLabel {
                        kind: $kind,
                        label: s.to_owned(),
                    })
            }
        }
    };
}
pub(crate) use labelled_enum;

labelled_enum! {
    /// Block size and transfer mode. One panel row each.
    Workload, "workload" {
        K4Discrete => "4K-Discrete",
        K4Overlay => "4K-Overlay",
        K64Discrete => "64K-Discrete",
        K64Overlay => "64K-Overlay",
        M1Discrete => "1M-Discrete",
        M1Overlay => "1M-Overlay",
    }
}

labelled_enum! {
    /// Whether the run targets one shared file or one file per worker. One panel column each.
    FileMode, "file mode" {
        Single => "Single",
        Multi => "Multi",
    }
}

labelled_enum! {
    /// IO backend under test.
    Library, "library" {
        Posix => "Posix",
        Fstream => "Fstream",
        PosixAio => "PosixAIO",
    }
}

labelled_enum! {
    Operation, "operation" {
        Read => "r",
        Write => "w",
        ReadWrite => "rw",
    }
}

pub const TRIALS: RangeInclusive<u32> = 1..=4;

/// One x-axis position of a panel, displayed as `r1`, `rw3`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub operation: Operation,
    pub trial: u32,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operation, self.trial)
    }
}

/// Categories in plotting order: trial-major, operation-minor.
pub fn categories() -> Vec<Category> {
    iproduct!(TRIALS, Operation::ALL.iter().copied())
        .map(|(trial, operation)| Category { operation, trial })
        .collect()
}

/// A single benchmark run in the matrix, ie. one log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixPoint {
    pub workload: Workload,
    pub file_mode: FileMode,
    pub library: Library,
    pub category: Category,
}

impl MatrixPoint {
    pub fn new(
        workload: Workload,
        file_mode: FileMode,
        library: Library,
        category: Category,
    ) -> Self {
        Self {
            workload,
            file_mode,
            library,
            category,
        }
    }
}

impl fmt::Display for MatrixPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.workload,
            self.file_mode,
            self.library,
            self.category.operation,
            self.category.trial
        )
    }
}
