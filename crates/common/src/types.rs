use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an id from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a buyer (consumer) account.
    ///
    /// Issued by the external authentication collaborator; this core only
    /// carries it around and compares it for ownership checks.
    BuyerId
}

uuid_id! {
    /// Unique identifier for a seller (farmer) profile.
    SellerId
}

uuid_id! {
    /// Unique identifier for a product listing.
    ///
    /// Carts and orders hold product ids as weak references; orders copy
    /// the fields they display so the product may be deleted independently.
    ProductId
}

uuid_id! {
    /// Unique identifier for a cart document.
    CartId
}

uuid_id! {
    /// Unique identifier for an order document.
    ///
    /// Distinct from the human-readable order number printed on receipts.
    OrderId
}
