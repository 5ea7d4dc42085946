//! Payment method descriptors as returned by the processor.
use serde::{Deserialize, Serialize};

/// Capability flags attached to a payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCapabilities {
    /// Card data is collected by the embedded widget and only a token is submitted.
    #[serde(default)]
    pub tokenized: bool,
    /// The processor expects a device fingerprint alongside the token.
    #[serde(default)]
    pub fraud_signals: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Value of the payment method selector (e.g. `AdyenComponent`).
    pub id: String,
    /// Display brand (e.g. `Cards`).
    pub brand: String,
    #[serde(default)]
    pub capabilities: MethodCapabilities,
}

impl MethodDescriptor {
    pub fn new(id: impl Into<String>, brand: impl Into<String>, capabilities: MethodCapabilities) -> Self {
        Self {
            id: id.into(),
            brand: brand.into(),
            capabilities,
        }
    }
}

/// Ordered, read-only list of payment methods valid for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodList {
    #[serde(rename = "paymentMethods")]
    methods: Vec<MethodDescriptor>,
}

impl MethodList {
    pub fn new(methods: Vec<MethodDescriptor>) -> Self {
        Self { methods }
    }

    pub fn get(&self, id: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn first(&self) -> Option<&MethodDescriptor> {
        self.methods.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
