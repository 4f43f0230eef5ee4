//! Status values shared across the order, payment and restaurant services.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::new(format!(
                        concat!("unknown ", stringify!($name), " {:?}"),
                        other
                    ))),
                }
            }
        }
    };
}

status_enum!(
    /// Order progress through payment and restaurant approval.
    OrderStatus {
        Pending => "PENDING",
        Paid => "PAID",
        Approved => "APPROVED",
        Cancelling => "CANCELLING",
        Cancelled => "CANCELLED",
    }
);

status_enum!(
    OrderApprovalStatus {
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
);

status_enum!(
    PaymentStatus {
        Completed => "COMPLETED",
        Failed => "FAILED",
        Cancelled => "CANCELLED",
        Pending => "PENDING",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_upper_case() {
        assert_eq!(OrderStatus::Cancelling.to_string(), "CANCELLING");
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        let status: OrderApprovalStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, OrderApprovalStatus::Rejected);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!("PAID".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        let err = "paid".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown OrderStatus \"paid\"");
    }
}
