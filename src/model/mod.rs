//! Sample entity model used by the command-line tools
//!
//! JSON field names are the wire names, so a record read with serde and a
//! table written with [`Naming::WireName`](crate::Naming) agree on column
//! names.

use crate::error::Result;
use crate::meta::{Entity, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::entity! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Address as "address" {
        pub street: String => "street",
        pub city: String => "city",
        #[serde(rename = "zipCode")]
        pub zipcode: String => "zipCode",
        pub country: String => "country",
    }
}

crate::entity! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ContactInfo as "contactinfo" {
        pub email: String => "email",
        pub phone: String => "phone",
        pub address: Address => "address",
        #[serde(rename = "previousAddresses")]
        pub previousaddresses: Vec<Address> => "previousAddresses",
    }
}

crate::entity! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Project as "project" {
        pub name: String => "name",
        pub description: String => "description",
        pub tags: Vec<String> => "tags",
    }
}

crate::entity! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Company as "company" {
        pub name: String => "name",
        pub headquarters: Address => "headquarters",
        #[serde(rename = "taxId")]
        pub taxid: String => "taxId",
        pub offices: BTreeMap<String, Address> => "offices",
    }
}

crate::entity! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct User as "user" {
        pub name: String => "name",
        pub age: i32 => "age",
        pub id: String => "id",
        pub data: String => "data",
        pub contact: ContactInfo => "contact",
        #[serde(skip_serializing_if = "Option::is_none")]
        pub employer: Option<Company> => "employer",
        pub projects: Vec<Project> => "projects",
        pub metadata: BTreeMap<String, String> => "metadata",
        pub investments: BTreeMap<String, Company> => "investments",
        /// Keyed by whole maps; JSON carries it as `[{"key": {..}, "value": n}]`
        #[serde(with = "entry_list")]
        pub nested: BTreeMap<BTreeMap<String, String>, i32> => "nested",
    }
}

/// Serde adapter for maps whose keys cannot be JSON object keys
pub mod entry_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry<K, V> {
        key: K,
        value: V,
    }

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, value)| Entry { key, value }))
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry<K, V>>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|entry| (entry.key, entry.value)).collect())
    }
}

/// Entity types the command-line tools can process
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    User,
    Company,
    Address,
    ContactInfo,
    Project,
}

impl ModelKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ModelKind::User => User::TYPE_NAME,
            ModelKind::Company => Company::TYPE_NAME,
            ModelKind::Address => Address::TYPE_NAME,
            ModelKind::ContactInfo => ContactInfo::TYPE_NAME,
            ModelKind::Project => Project::TYPE_NAME,
        }
    }

    /// A validated registry rooted at this kind
    pub fn registry(self) -> Result<Registry> {
        match self {
            ModelKind::User => Registry::for_root::<User>(),
            ModelKind::Company => Registry::for_root::<Company>(),
            ModelKind::Address => Registry::for_root::<Address>(),
            ModelKind::ContactInfo => Registry::for_root::<ContactInfo>(),
            ModelKind::Project => Registry::for_root::<Project>(),
        }
    }
}
