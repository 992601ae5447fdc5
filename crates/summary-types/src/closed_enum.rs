/// Declares a closed enumeration whose variants map one-to-one onto fixed wire strings.
///
/// Generates `serde` derives with per-variant renames, `as_str`, `ALL`, `VALUES`, `FIELD`,
/// `Display` and a strict `FromStr`.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Wire name of the field this enumeration populates.
            pub const FIELD: &'static str = $field;

            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Every accepted wire value, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            /// Returns the exact wire text of this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::EnumParseError {
                        field: $field,
                        value: other.to_owned(),
                        allowed: Self::VALUES,
                    }),
                }
            }
        }
    };
}
