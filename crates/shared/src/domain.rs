use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(TransferId);
id_newtype!(CompanyId);
id_newtype!(WarehouseId);
id_newtype!(ProductId);

/// Lifecycle state of a stock transfer, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferState {
    #[serde(rename = "EN_TRANSITO")]
    InTransit,
    #[serde(rename = "RECIBIDO")]
    Received,
    #[serde(rename = "RECIBIDO_PARCIAL")]
    ReceivedPartial,
    #[serde(rename = "RECIBIDO_SOBRANTE")]
    ReceivedSurplus,
    #[serde(rename = "PERDIDO")]
    Lost,
}

/// Colour family used when rendering a state tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagColor {
    Blue,
    Green,
    Orange,
    Purple,
    Red,
}

/// The single action a client may offer for a transfer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Receive,
    Revert,
}

impl TransferAction {
    pub fn label(self) -> &'static str {
        match self {
            TransferAction::Receive => "Receive",
            TransferAction::Revert => "Revert",
        }
    }
}

impl TransferState {
    pub const ALL: [TransferState; 5] = [
        TransferState::InTransit,
        TransferState::Received,
        TransferState::ReceivedPartial,
        TransferState::ReceivedSurplus,
        TransferState::Lost,
    ];

    /// Value used for the `estado` query parameter and JSON field.
    pub fn wire_name(self) -> &'static str {
        match self {
            TransferState::InTransit => "EN_TRANSITO",
            TransferState::Received => "RECIBIDO",
            TransferState::ReceivedPartial => "RECIBIDO_PARCIAL",
            TransferState::ReceivedSurplus => "RECIBIDO_SOBRANTE",
            TransferState::Lost => "PERDIDO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransferState::InTransit => "In transit",
            TransferState::Received => "Received",
            TransferState::ReceivedPartial => "Received (partial)",
            TransferState::ReceivedSurplus => "Received (surplus)",
            TransferState::Lost => "Lost",
        }
    }

    pub fn tag_color(self) -> TagColor {
        match self {
            TransferState::InTransit => TagColor::Blue,
            TransferState::Received => TagColor::Green,
            TransferState::ReceivedPartial => TagColor::Orange,
            TransferState::ReceivedSurplus => TagColor::Purple,
            TransferState::Lost => TagColor::Red,
        }
    }

    pub fn is_received(self) -> bool {
        match self {
            TransferState::Received
            | TransferState::ReceivedPartial
            | TransferState::ReceivedSurplus => true,
            TransferState::InTransit | TransferState::Lost => false,
        }
    }

    /// Action offered for a row in this state. `Lost` is terminal for the client.
    pub fn available_action(self) -> Option<TransferAction> {
        match self {
            TransferState::InTransit => Some(TransferAction::Receive),
            TransferState::Received
            | TransferState::ReceivedPartial
            | TransferState::ReceivedSurplus => Some(TransferAction::Revert),
            TransferState::Lost => None,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TransferState {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        TransferState::ALL
            .into_iter()
            .find(|state| {
                state.wire_name() == normalized
                    || state.label().to_ascii_uppercase().replace(['(', ')'], "").replace(' ', "_")
                        == normalized
            })
            .ok_or_else(|| format!("unknown transfer state '{value}'"))
    }
}
