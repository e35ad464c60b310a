//! Fixture entities.

use std::collections::BTreeMap;

use vaultmap::{persistent_entity, Entity};

/// The minimal entity from the repository round trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Foo {
    pub id: String,
    pub name: String,
}

persistent_entity!(Foo {
    #[id] id: String,
    name: String,
});

impl Foo {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

persistent_entity!(Address {
    street: String,
    city: String,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub age: u32,
    pub active: bool,
    pub rating: f64,
    pub address: Option<Address>,
    pub tags: Vec<String>,
    pub scores: BTreeMap<String, i64>,
}

persistent_entity!(Person {
    #[id] id: Option<String>,
    first_name: String,
    last_name: Option<String>,
    age: u32,
    active: bool,
    rating: f64,
    address: Option<Address>,
    tags: Vec<String>,
    scores: BTreeMap<String, i64>,
});

/// A fully populated person.
pub fn walter() -> Person {
    let mut scores = BTreeMap::new();
    scores.insert("chemistry".to_string(), 99);
    scores.insert("teaching".to_string(), 42);

    Person {
        id: Some("walter".to_string()),
        first_name: "Walter".to_string(),
        last_name: Some("White".to_string()),
        age: 50,
        active: true,
        rating: 4.5,
        address: Some(Address {
            street: "308 Negra Arroyo Lane".to_string(),
            city: "Albuquerque".to_string(),
        }),
        tags: vec!["mentor".to_string(), "chemist".to_string()],
        scores,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dog {
    pub name: String,
    pub good: bool,
}

persistent_entity!(Dog {
    name: String,
    good: bool,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cat {
    pub name: String,
    pub lives: u8,
}

persistent_entity!(Cat {
    name: String,
    lives: u8,
});

/// Entity with a polymorphic slot.
#[derive(Debug, Clone, Default)]
pub struct Owner {
    pub id: String,
    pub pet: Option<Box<dyn Entity>>,
}

persistent_entity!(Owner {
    #[id] id: String,
    pet: Option<Box<dyn Entity>>,
});

/// Entity with a list of nested entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Garage {
    pub id: String,
    pub addresses: Vec<Address>,
}

persistent_entity!(Garage {
    #[id] id: String,
    addresses: Vec<Address>,
});
