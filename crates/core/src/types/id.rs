//! Newtype IDs for type-safe entity references.
//!
//! Every document in the key-value store identifies its records with plain
//! strings. The `define_id!` macro wraps those strings so a catalog item ID
//! can never be passed where a customer ID is expected.

use uuid::Uuid;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `is_blank()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use foilbox_core::define_id;
/// define_id!(DeckId);
/// define_id!(BinderId);
///
/// let deck = DeckId::new("deck-1");
/// assert_eq!(deck.as_str(), "deck-1");
///
/// // These are different types, so this won't compile:
/// // let _: BinderId = deck;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the ID is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CatalogItemId);
define_id!(CustomerId);
define_id!(CouponId);
define_id!(CreditCardId);
define_id!(AddressId);
define_id!(OrderId);

/// Prefix carried by every generated order ID.
pub const ORDER_ID_PREFIX: &str = "ORD-";

impl OrderId {
    /// Mint a fresh, collision-resistant order ID (`ORD-` + UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("{ORDER_ID_PREFIX}{uuid}"))
    }
}
