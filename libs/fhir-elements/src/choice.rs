//! Values of choice (`[x]`) fields
//!
//! A choice field holds exactly one value out of a declared list of data
//! types. [`DataValue`] is the closed set of data types this crate models and
//! [`DataType`] its tag; each field descriptor names the subset it permits.

use crate::datatypes::{
    CodeableConcept, Coding, HumanName, Identifier, Period, Quantity, Reference,
};
use crate::element::Element;
use crate::primitive::{
    Boolean, Code, Date, DateTime, Decimal, FhirString, Id, Instant, Integer, Markdown,
    UnsignedInt, Uri,
};
use crate::visitor::Visitable;

macro_rules! data_values {
    ($($variant:ident($ty:ty) => $name:literal),* $(,)?) => {
        /// Runtime data type of a choice value
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DataType {
            $($variant,)*
        }

        impl DataType {
            /// Every data type a choice value can have
            pub const ALL: &'static [DataType] = &[$(DataType::$variant,)*];

            /// Type name as defined by the standard
            pub fn name(&self) -> &'static str {
                match self {
                    $(DataType::$variant => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<DataType> {
                match name {
                    $($name => Some(DataType::$variant),)*
                    _ => None,
                }
            }
        }

        /// A value stored in a choice field
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum DataValue {
            $($variant($ty),)*
        }

        impl DataValue {
            pub fn data_type(&self) -> DataType {
                match self {
                    $(DataValue::$variant(_) => DataType::$variant,)*
                }
            }

            pub fn as_visitable(&self) -> &dyn Visitable {
                match self {
                    $(DataValue::$variant(value) => value,)*
                }
            }

            pub fn as_element(&self) -> &dyn Element {
                match self {
                    $(DataValue::$variant(value) => value,)*
                }
            }
        }

        $(
            impl From<$ty> for DataValue {
                fn from(value: $ty) -> Self {
                    DataValue::$variant(value)
                }
            }
        )*
    };
}

data_values! {
    Boolean(Boolean) => "boolean",
    Integer(Integer) => "integer",
    UnsignedInt(UnsignedInt) => "unsignedInt",
    Decimal(Decimal) => "decimal",
    String(FhirString) => "string",
    Markdown(Markdown) => "markdown",
    Uri(Uri) => "uri",
    Code(Code) => "code",
    Id(Id) => "id",
    Date(Date) => "date",
    DateTime(DateTime) => "dateTime",
    Instant(Instant) => "instant",
    CodeableConcept(CodeableConcept) => "CodeableConcept",
    Coding(Coding) => "Coding",
    HumanName(HumanName) => "HumanName",
    Identifier(Identifier) => "Identifier",
    Period(Period) => "Period",
    Quantity(Quantity) => "Quantity",
    Reference(Reference) => "Reference",
}

impl DataValue {
    /// The stored value, if it is a `T`
    pub fn get<T: Visitable>(&self) -> Option<&T> {
        self.as_visitable().as_any().downcast_ref::<T>()
    }

    pub fn is_absent(&self) -> bool {
        self.as_element().is_absent()
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_type_follows_the_variant() {
        let value = DataValue::from(DateTime::from("2024-01-01"));
        assert_eq!(value.data_type(), DataType::DateTime);
        assert_eq!(value.as_visitable().type_name(), "dateTime");
        assert!(value.get::<DateTime>().is_some());
        assert!(value.get::<Date>().is_none());
    }

    #[test]
    fn names_round_trip() {
        for data_type in DataType::ALL {
            assert_eq!(DataType::from_name(data_type.name()), Some(*data_type));
        }
        assert_eq!(DataType::from_name("Narrative"), None);
    }

    #[test]
    fn every_variant_names_its_node_type() {
        let values = [
            DataValue::from(Boolean::from(true)),
            DataValue::from(FhirString::from("s")),
            DataValue::from(Coding::builder().code(Code::from("c")).build().unwrap()),
            DataValue::from(Period::builder().start(DateTime::from("2024")).build().unwrap()),
        ];
        for value in &values {
            assert_eq!(value.data_type().name(), value.as_visitable().type_name());
            assert!(!value.is_absent());
        }
    }
}
