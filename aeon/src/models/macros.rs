/// Defines a closed string enumeration as it appears on the wire and generates:
/// - derives (Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)
/// - `ALL` / `NAMES` constants and `as_str()`
/// - `Display` and `FromStr` (unknown strings fail with a `literal_error`)
/// - `Serialize` / `Deserialize` as the wire string
///
/// Usage:
///   string_enum! { pub enum Operator { Single => "SINGLE", Many => "MANY" } }
#[macro_export]
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const NAMES: &'static [&'static str] = &[$($wire),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::ValidationError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::error::ValidationError::not_allowed(other, Self::NAMES)),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse()
                    .map_err(|err: $crate::error::ValidationError| ::serde::de::Error::custom(err.kind()))
            }
        }
    };
}

/// Generates validated accessors for the private fields of a model:
/// - `field(&self) -> &T`
/// - `set_field(&mut self, value) -> ModelResult<()>`, which runs the field
///   rule, commits, then runs the optional whole-object check; on any failure
///   the previous value is restored and the error names the field
/// - a private `validate_fields(&self)` that runs every rule plus the
///   whole-object check, for use by constructors and deserialization
///
/// Each rule is a non-capturing closure `|value: &T| -> ModelResult<()>`.
///
/// Usage:
///   validated_fields! {
///       Window {
///           start / set_start: Option<TimeValue> = |_| Ok(());
///       } cross Window::check_order
///   }
#[macro_export]
macro_rules! validated_fields {
    ($ty:ident { $($body:tt)* }) => {
        $crate::validated_fields!(@impl $ty, |_: &$ty| Ok(()), { $($body)* });
    };
    ($ty:ident { $($body:tt)* } cross $cross:expr) => {
        $crate::validated_fields!(@impl $ty, $cross, { $($body)* });
    };
    (@impl $ty:ident, $cross:expr, {
        $( $(#[$doc:meta])* $field:ident / $setter:ident : $fty:ty = $check:expr; )*
    }) => {
        impl $ty {
            $(
                $(#[$doc])*
                pub fn $field(&self) -> &$fty {
                    &self.$field
                }

                #[doc = concat!("Validate and assign `", stringify!($field), "`; the previous value is kept on failure.")]
                pub fn $setter(&mut self, value: impl Into<$fty>) -> $crate::error::ModelResult<()> {
                    let value: $fty = value.into();
                    let check: fn(&$fty) -> $crate::error::ModelResult<()> = $check;
                    check(&value).map_err(|err| err.in_field(stringify!($field)))?;
                    let previous = ::std::mem::replace(&mut self.$field, value);
                    let cross: fn(&$ty) -> $crate::error::ModelResult<()> = $cross;
                    if let Err(err) = cross(self) {
                        self.$field = previous;
                        return Err(err);
                    }
                    Ok(())
                }
            )*

            #[allow(dead_code)]
            fn validate_fields(&self) -> $crate::error::ModelResult<()> {
                $(
                    {
                        let check: fn(&$fty) -> $crate::error::ModelResult<()> = $check;
                        check(&self.$field).map_err(|err| err.in_field(stringify!($field)))?;
                    }
                )*
                let cross: fn(&$ty) -> $crate::error::ModelResult<()> = $cross;
                cross(self)
            }
        }
    };
}
