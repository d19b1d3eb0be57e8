use serde::{Deserialize, Serialize};

/// Declares an integer identifier newtype.
///
/// Catalog identities are plain database integers; wrapping them keeps a
/// brand id from being passed where an item id is expected.
macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wraps a raw identity value.
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Returns the raw identity value.
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id! {
    /// Identity of a catalog item, assigned by the catalog store.
    CatalogItemId
}

int_id! {
    /// Identity of a catalog brand.
    CatalogBrandId
}

int_id! {
    /// Identity of a catalog type.
    CatalogTypeId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_raw_value() {
        assert!(CatalogItemId::new(12) < CatalogItemId::new(13));
    }

    #[test]
    fn id_from_i32_preserves_value() {
        let id = CatalogBrandId::from(4);
        assert_eq!(id.as_i32(), 4);
        assert_eq!(i32::from(id), 4);
    }

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&CatalogTypeId::new(3)).unwrap();
        assert_eq!(json, "3");

        let id: CatalogItemId = serde_json::from_str("42").unwrap();
        assert_eq!(id, CatalogItemId::new(42));
    }

    #[test]
    fn id_display() {
        assert_eq!(CatalogItemId::new(7).to_string(), "7");
    }
}
