//! HTTP handlers, one module per resource.

pub mod network;
pub mod products;
pub mod transactions;

use serde::{Deserialize, Serialize};

/// Body of the plain acknowledgements (`{"message": "Product updated"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        MessageBody {
            message: message.into(),
        }
    }
}
