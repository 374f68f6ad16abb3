//! String-tagged identifier enums
//!
//! `define_id_enum!` declares an enum whose variants serialize to fixed kebab-case tags,
//! accept human aliases on lookup, and keep unrecognized tags in a `Custom(String)`
//! variant instead of failing deserialization. Callers decide what a custom tag means
//! (generic fallback, rejection, ...).

#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $tag:literal $( | $alias:literal )*
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            Custom(String),
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.tag())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from_tag(&s))
            }
        }

        impl $enum_name {
            /// Canonical tag for this value
            pub fn tag(&self) -> &str {
                match self {
                    $(
                        Self::$variant => $tag,
                    )*
                    Self::Custom(name) => name.as_str(),
                }
            }

            /// Resolves a tag or alias (case-insensitive) to a known variant
            pub fn from_name(name: &str) -> Option<Self> {
                match name.to_ascii_lowercase().as_str() {
                    $(
                        $tag $(| $alias)* => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Like `from_name`, but keeps unknown tags as `Custom`
            pub fn from_tag(name: &str) -> Self {
                Self::from_name(name).unwrap_or_else(|| Self::Custom(name.to_string()))
            }

            pub fn is_custom(&self) -> bool {
                matches!(self, Self::Custom(_))
            }

            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.tag())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::from_tag(s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::define_id_enum! {
        Shade {
            Light => "light" | "pale",
            Dark => "dark",
        }
    }

    #[test]
    fn test_tag_and_alias_lookup() {
        assert_eq!(Shade::from_name("light"), Some(Shade::Light));
        assert_eq!(Shade::from_name("PALE"), Some(Shade::Light));
        assert_eq!(Shade::from_name("grey"), None);
        assert_eq!(Shade::Dark.tag(), "dark");
        assert_eq!(Shade::all_variants().len(), 2);
    }

    #[test]
    fn test_unknown_tag_becomes_custom() {
        let shade: Shade = serde_json::from_str("\"grey\"").unwrap();
        assert_eq!(shade, Shade::Custom("grey".to_string()));
        assert!(shade.is_custom());
        assert_eq!(serde_json::to_string(&shade).unwrap(), "\"grey\"");
    }

    #[test]
    fn test_display_uses_tag() {
        assert_eq!(Shade::Light.to_string(), "light");
        assert_eq!("dark".parse::<Shade>().unwrap(), Shade::Dark);
    }
}
