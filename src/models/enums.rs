use serde::{Deserialize, Serialize};

/// Macro to generate enum with serde wire names + as_str
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }
    };
}

str_enum!(Intent {
    Claim => "claim",
    Preauth => "preauth",
    Referral => "referral",
    Adjudication => "adjudication",
});

/// `meta.source_type` for intakes originating at a care provider.
pub const SOURCE_TYPE_PROVIDER: &str = "provider";

/// `meta.source_type` for intakes originating at a payer.
pub const SOURCE_TYPE_PAYER: &str = "payer";
