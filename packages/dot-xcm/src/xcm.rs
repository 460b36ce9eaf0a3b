//! XCM location and asset descriptors
//!
//! Typed versions of the `MultiLocation`/`MultiAsset` structures passed to
//! `xcmPallet`/`polkadotXcm` calls. They are converted to dynamic
//! `scale_value::Value`s (XCM V2 shape) only at the call-building boundary,
//! and parsed back from the versioned records the asset registry stores.

use crate::address::decode_address;
use crate::error::{Error, Result};
use subxt_core::ext::scale_value::{Composite, Primitive, Value, ValueDef};

/// Maximum number of junctions in an interior path (X1..X8)
pub const MAX_JUNCTIONS: usize = 8;

/// XCM version the outgoing values are wrapped in
const XCM_VERSION: &str = "V2";

/// Network scope of an account junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkId {
    #[default]
    Any,
    Polkadot,
    Kusama,
}

/// A single step in an interior path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Junction {
    Parachain(u32),
    AccountId32 { network: NetworkId, id: [u8; 32] },
    PalletInstance(u8),
    GeneralIndex(u128),
    GeneralKey(Vec<u8>),
}

/// Non-empty path of at most [`MAX_JUNCTIONS`] junctions
///
/// Only built through [`Junctions::x1`] and [`Junctions::from_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionPath(Vec<Junction>);

impl JunctionPath {
    pub fn as_slice(&self) -> &[Junction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an empty path is `Junctions::Here`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Interior of a location: either `Here` or a path of 1..=8 junctions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Junctions {
    Here,
    X(JunctionPath),
}

impl Junctions {
    /// Single-junction interior
    pub fn x1(junction: Junction) -> Self {
        Junctions::X(JunctionPath(vec![junction]))
    }

    /// Build an interior from a path, validating its length
    pub fn from_path(path: Vec<Junction>) -> Result<Self> {
        match path.len() {
            0 => Ok(Junctions::Here),
            n if n <= MAX_JUNCTIONS => Ok(Junctions::X(JunctionPath(path))),
            n => Err(Error::InvalidInput(format!(
                "Interior path has {} junctions, at most {} allowed",
                n, MAX_JUNCTIONS
            ))),
        }
    }

    pub fn is_here(&self) -> bool {
        matches!(self, Junctions::Here)
    }

    pub fn junctions(&self) -> &[Junction] {
        match self {
            Junctions::Here => &[],
            Junctions::X(path) => path.as_slice(),
        }
    }
}

/// XCM multi-location: parent count plus interior path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocation {
    pub parents: u8,
    pub interior: Junctions,
}

impl AssetLocation {
    pub fn here(parents: u8) -> Self {
        Self {
            parents,
            interior: Junctions::Here,
        }
    }

    pub fn parachain(parents: u8, para_id: u32) -> Self {
        Self {
            parents,
            interior: Junctions::x1(Junction::Parachain(para_id)),
        }
    }

    /// Parse a location out of a (possibly versioned) dynamic value
    ///
    /// Accepts `V1`/`V2`/`V3` wrappers as well as a bare `{ parents, interior }`.
    pub fn from_value<T>(value: &Value<T>) -> Result<Self> {
        let location = match &value.value {
            ValueDef::Variant(variant) if is_version_tag(&variant.name) => {
                single_value(&variant.values)
                    .ok_or_else(|| invalid("versioned location must wrap one value"))?
            }
            _ => value,
        };

        let ValueDef::Composite(Composite::Named(fields)) = &location.value else {
            return Err(invalid("location must be a named composite"));
        };

        let parents = field(fields, "parents")?
            .as_u128()
            .and_then(|p| u8::try_from(p).ok())
            .ok_or_else(|| invalid("parents must be a u8"))?;
        let interior = parse_junctions(field(fields, "interior")?)?;

        Ok(Self { parents, interior })
    }

    pub fn to_value(&self) -> Value<()> {
        Value::named_composite([
            ("parents", Value::u128(self.parents as u128)),
            ("interior", junctions_value(&self.interior)),
        ])
    }

    /// `VersionedMultiLocation` wrapper around [`Self::to_value`]
    pub fn to_versioned_value(&self) -> Value<()> {
        Value::unnamed_variant(XCM_VERSION, [self.to_value()])
    }
}

/// Fungible asset with a concrete location id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiAsset {
    pub location: AssetLocation,
    pub amount: u128,
}

impl MultiAsset {
    pub fn new(location: AssetLocation, amount: u128) -> Self {
        Self { location, amount }
    }

    pub fn to_value(&self) -> Value<()> {
        Value::named_composite([
            (
                "id",
                Value::unnamed_variant("Concrete", [self.location.to_value()]),
            ),
            (
                "fun",
                Value::unnamed_variant("Fungible", [Value::u128(self.amount)]),
            ),
        ])
    }
}

/// `VersionedMultiAssets` value for a list of assets
pub fn versioned_assets(assets: &[MultiAsset]) -> Value<()> {
    let list = Value::unnamed_composite(assets.iter().map(MultiAsset::to_value));
    // MultiAssets is a newtype around the list
    Value::unnamed_variant(XCM_VERSION, [Value::unnamed_composite([list])])
}

/// Transfer recipient: `{ parents: 0, X1(AccountId32 { network: Any, id }) }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beneficiary(AssetLocation);

impl Beneficiary {
    pub fn from_account_id(id: [u8; 32]) -> Self {
        Beneficiary(AssetLocation {
            parents: 0,
            interior: Junctions::x1(Junction::AccountId32 {
                network: NetworkId::Any,
                id,
            }),
        })
    }

    pub fn from_address(address: &str) -> Result<Self> {
        Ok(Self::from_account_id(decode_address(address)?))
    }

    pub fn location(&self) -> &AssetLocation {
        &self.0
    }

    /// The embedded 32-byte account id
    pub fn account_id(&self) -> [u8; 32] {
        match self.0.interior.junctions() {
            [Junction::AccountId32 { id, .. }] => *id,
            _ => unreachable!("beneficiary is always an X1 account junction"),
        }
    }
}

impl From<Beneficiary> for AssetLocation {
    fn from(beneficiary: Beneficiary) -> Self {
        beneficiary.0
    }
}

// =============================================================================
// Value encoding
// =============================================================================

fn junctions_value(junctions: &Junctions) -> Value<()> {
    match junctions {
        Junctions::Here => Value::unnamed_variant("Here", []),
        Junctions::X(path) => Value::unnamed_variant(
            format!("X{}", path.len()),
            path.as_slice().iter().map(junction_value),
        ),
    }
}

fn junction_value(junction: &Junction) -> Value<()> {
    match junction {
        Junction::Parachain(id) => Value::unnamed_variant("Parachain", [Value::u128(*id as u128)]),
        Junction::AccountId32 { network, id } => Value::named_variant(
            "AccountId32",
            [
                ("network", network_value(*network)),
                ("id", Value::from_bytes(id)),
            ],
        ),
        Junction::PalletInstance(index) => {
            Value::unnamed_variant("PalletInstance", [Value::u128(*index as u128)])
        }
        Junction::GeneralIndex(index) => {
            Value::unnamed_variant("GeneralIndex", [Value::u128(*index)])
        }
        Junction::GeneralKey(key) => Value::unnamed_variant("GeneralKey", [Value::from_bytes(key)]),
    }
}

fn network_value(network: NetworkId) -> Value<()> {
    let name = match network {
        NetworkId::Any => "Any",
        NetworkId::Polkadot => "Polkadot",
        NetworkId::Kusama => "Kusama",
    };
    Value::unnamed_variant(name, [])
}

// =============================================================================
// Value parsing
// =============================================================================

fn is_version_tag(name: &str) -> bool {
    name.len() > 1 && name.starts_with('V') && name[1..].chars().all(|c| c.is_ascii_digit())
}

fn invalid(msg: &str) -> Error {
    Error::InvalidInput(format!("Malformed XCM location: {}", msg))
}

fn single_value<T>(composite: &Composite<T>) -> Option<&Value<T>> {
    let mut values = composite.values();
    match (values.next(), values.next()) {
        (Some(value), None) => Some(value),
        _ => None,
    }
}

fn field<'a, T>(fields: &'a [(String, Value<T>)], name: &str) -> Result<&'a Value<T>> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
        .ok_or_else(|| invalid(&format!("missing field `{}`", name)))
}

fn parse_junctions<T>(value: &Value<T>) -> Result<Junctions> {
    let ValueDef::Variant(variant) = &value.value else {
        return Err(invalid("interior must be a variant"));
    };

    if variant.name == "Here" {
        return Ok(Junctions::Here);
    }

    let arity: usize = variant
        .name
        .strip_prefix('X')
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| invalid(&format!("unknown interior `{}`", variant.name)))?;

    // V3+ wraps multi-junction paths in a single array value
    let path = match single_value(&variant.values) {
        Some(Value {
            value: ValueDef::Composite(inner),
            ..
        }) if arity > 1 => inner.values().map(parse_junction).collect::<Result<Vec<_>>>()?,
        _ => variant
            .values
            .values()
            .map(parse_junction)
            .collect::<Result<Vec<_>>>()?,
    };

    if path.len() != arity {
        return Err(invalid(&format!(
            "{} declares {} junctions, found {}",
            variant.name,
            arity,
            path.len()
        )));
    }
    Junctions::from_path(path)
}

fn parse_junction<T>(value: &Value<T>) -> Result<Junction> {
    let ValueDef::Variant(variant) = &value.value else {
        return Err(invalid("junction must be a variant"));
    };
    let inner = || single_value(&variant.values).ok_or_else(|| invalid("junction payload"));

    match variant.name.as_str() {
        "Parachain" => inner()?
            .as_u128()
            .and_then(|id| u32::try_from(id).ok())
            .map(Junction::Parachain)
            .ok_or_else(|| invalid("parachain id must be a u32")),
        "PalletInstance" => inner()?
            .as_u128()
            .and_then(|id| u8::try_from(id).ok())
            .map(Junction::PalletInstance)
            .ok_or_else(|| invalid("pallet instance must be a u8")),
        "GeneralIndex" => inner()?
            .as_u128()
            .map(Junction::GeneralIndex)
            .ok_or_else(|| invalid("general index must be a u128")),
        "GeneralKey" => parse_general_key(&variant.values).map(Junction::GeneralKey),
        "AccountId32" => {
            let Composite::Named(fields) = &variant.values else {
                return Err(invalid("AccountId32 must have named fields"));
            };
            let id = value_bytes(field(fields, "id")?)?
                .try_into()
                .map_err(|_| invalid("account id must be 32 bytes"))?;
            let network = parse_network(field(fields, "network")?)?;
            Ok(Junction::AccountId32 { network, id })
        }
        other => Err(invalid(&format!("unsupported junction `{}`", other))),
    }
}

/// V2 stores the raw key, V3 stores `{ length, data: [u8; 32] }`
fn parse_general_key<T>(values: &Composite<T>) -> Result<Vec<u8>> {
    match values {
        Composite::Named(fields) => {
            let length = field(fields, "length")?
                .as_u128()
                .and_then(|l| usize::try_from(l).ok())
                .ok_or_else(|| invalid("general key length"))?;
            let mut data = value_bytes(field(fields, "data")?)?;
            if length > data.len() {
                return Err(invalid("general key length exceeds data"));
            }
            data.truncate(length);
            Ok(data)
        }
        Composite::Unnamed(_) => {
            value_bytes(single_value(values).ok_or_else(|| invalid("general key payload"))?)
        }
    }
}

fn parse_network<T>(value: &Value<T>) -> Result<NetworkId> {
    let ValueDef::Variant(variant) = &value.value else {
        return Err(invalid("network must be a variant"));
    };
    match variant.name.as_str() {
        "Any" | "None" => Ok(NetworkId::Any),
        "Polkadot" => Ok(NetworkId::Polkadot),
        "Kusama" => Ok(NetworkId::Kusama),
        // V3 wraps the network in an Option
        "Some" => parse_network(single_value(&variant.values).ok_or_else(|| invalid("network"))?),
        other => Err(invalid(&format!("unsupported network `{}`", other))),
    }
}

fn value_bytes<T>(value: &Value<T>) -> Result<Vec<u8>> {
    match &value.value {
        ValueDef::Composite(composite) => composite
            .values()
            .map(|v| {
                v.as_u128()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| invalid("expected byte"))
            })
            .collect(),
        ValueDef::Primitive(Primitive::String(s)) => {
            let s = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(s).map_err(|e| invalid(&format!("bad hex bytes: {}", e)))
        }
        _ => Err(invalid("expected byte sequence")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_value_roundtrip_through_versioned_record() {
        let location = AssetLocation {
            parents: 1,
            interior: Junctions::from_path(vec![
                Junction::Parachain(2000),
                Junction::GeneralKey(vec![0x00, 0x01]),
            ])
            .unwrap(),
        };
        let parsed = AssetLocation::from_value(&location.to_versioned_value()).unwrap();
        assert_eq!(parsed, location);
    }

    #[test]
    fn test_parse_v3_record() {
        // { V3: { parents: 1, interior: X2([Parachain(2004), GeneralKey { length: 2, data }]) } }
        let mut data = [0u8; 32];
        data[0] = 0x00;
        data[1] = 0x80;
        let value = Value::unnamed_variant(
            "V3",
            [Value::named_composite([
                ("parents", Value::u128(1)),
                (
                    "interior",
                    Value::unnamed_variant(
                        "X2",
                        [Value::unnamed_composite([
                            Value::unnamed_variant("Parachain", [Value::u128(2004)]),
                            Value::named_variant(
                                "GeneralKey",
                                [
                                    ("length", Value::u128(2)),
                                    ("data", Value::from_bytes(data)),
                                ],
                            ),
                        ])],
                    ),
                ),
            ])],
        );

        let parsed = AssetLocation::from_value(&value).unwrap();
        assert_eq!(parsed.parents, 1);
        assert_eq!(
            parsed.interior,
            Junctions::from_path(vec![
                Junction::Parachain(2004),
                Junction::GeneralKey(vec![0x00, 0x80])
            ])
            .unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_arity_mismatch() {
        let value = Value::named_composite([
            ("parents", Value::u128(0)),
            (
                "interior",
                Value::unnamed_variant("X2", [Value::unnamed_variant("Parachain", [Value::u128(1)])]),
            ),
        ]);
        assert!(AssetLocation::from_value(&value).is_err());
    }

    #[test]
    fn test_beneficiary_from_address() {
        let beneficiary =
            Beneficiary::from_address("5EGoFA95omzemRssELLDjVenNZ68aXyUeqtKQScXSEBvVJkr").unwrap();
        assert_eq!(beneficiary.location().parents, 0);
        assert_eq!(
            hex::encode(beneficiary.account_id()),
            "61b18c6dc02ddcabdeac56cb4f21a971cc41cc97640f6f85b073480008c53a0d"
        );

        let parsed = AssetLocation::from_value(&beneficiary.location().to_value()).unwrap();
        assert_eq!(&parsed, beneficiary.location());
    }

    #[test]
    fn test_from_path_bounds() {
        assert_eq!(Junctions::from_path(vec![]).unwrap(), Junctions::Here);
        assert!(Junctions::from_path(vec![Junction::PalletInstance(50); 9]).is_err());

        let full = Junctions::from_path(vec![Junction::PalletInstance(50); MAX_JUNCTIONS]).unwrap();
        assert_eq!(full.junctions().len(), MAX_JUNCTIONS);
    }

    #[test]
    fn test_interior_never_encodes_empty_path() {
        let location = AssetLocation {
            parents: 0,
            interior: Junctions::from_path(vec![]).unwrap(),
        };
        let value = location.to_value();
        let ValueDef::Composite(Composite::Named(fields)) = &value.value else {
            panic!("expected named composite");
        };
        let ValueDef::Variant(interior) = &field(fields, "interior").unwrap().value else {
            panic!("expected interior variant");
        };
        assert_eq!(interior.name, "Here");
        assert_eq!(AssetLocation::from_value(&value).unwrap(), location);
    }

    #[test]
    fn test_general_key_length_out_of_range() {
        let value = Value::named_composite([
            ("parents", Value::u128(0)),
            (
                "interior",
                Value::unnamed_variant(
                    "X1",
                    [Value::named_variant(
                        "GeneralKey",
                        [
                            ("length", Value::u128(u128::MAX)),
                            ("data", Value::from_bytes([0u8; 32])),
                        ],
                    )],
                ),
            ),
        ]);
        assert!(matches!(
            AssetLocation::from_value(&value),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_versioned_assets_shape() {
        let value = versioned_assets(&[MultiAsset::new(AssetLocation::here(0), 10)]);
        let ValueDef::Variant(variant) = &value.value else {
            panic!("expected versioned variant");
        };
        assert_eq!(variant.name, "V2");
    }
}
