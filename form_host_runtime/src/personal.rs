use crate::error::{SelectionError, SubmitError};
use crate::payload::CanonicalPayload;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub value: &'static str,
    pub label: &'static str,
}

pub const COUNTRIES: &[Country] = &[
    Country {
        value: "Netherlands",
        label: "Nederland",
    },
    Country {
        value: "Belgium",
        label: "België",
    },
    Country {
        value: "Germany",
        label: "Duitsland",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PersonalField {
    Email,
    Country,
    FirstName,
    LastName,
    Company,
    StreetName,
    HouseNumber,
    PostalCode,
    City,
    Phone,
}

impl PersonalField {
    pub const ALL: [PersonalField; 10] = [
        PersonalField::Email,
        PersonalField::Country,
        PersonalField::FirstName,
        PersonalField::LastName,
        PersonalField::Company,
        PersonalField::StreetName,
        PersonalField::HouseNumber,
        PersonalField::PostalCode,
        PersonalField::City,
        PersonalField::Phone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PersonalField::Email => "email",
            PersonalField::Country => "country",
            PersonalField::FirstName => "firstName",
            PersonalField::LastName => "lastName",
            PersonalField::Company => "company",
            PersonalField::StreetName => "streetName",
            PersonalField::HouseNumber => "houseNumber",
            PersonalField::PostalCode => "postalCode",
            PersonalField::City => "city",
            PersonalField::Phone => "phone",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn is_required(self) -> bool {
        !matches!(self, PersonalField::Company | PersonalField::Phone)
    }

    fn label_keys(self) -> [&'static str; 2] {
        match self {
            PersonalField::Email => ["emailLabel", "lb_email"],
            PersonalField::Country => ["countryLabel", "lb_country"],
            PersonalField::FirstName => ["firstNameLabel", "lb_firstName"],
            PersonalField::LastName => ["lastNameLabel", "lb_lastName"],
            PersonalField::Company => ["companyLabel", "lb_company"],
            PersonalField::StreetName => ["streetNameLabel", "lb_streetName"],
            PersonalField::HouseNumber => ["houseNumberLabel", "lb_houseNumber"],
            PersonalField::PostalCode => ["postalCodeLabel", "lb_postalCode"],
            PersonalField::City => ["cityLabel", "lb_city"],
            PersonalField::Phone => ["phoneLabel", "lb_phone"],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLabel {
    pub field: PersonalField,
    pub label: String,
    pub required: bool,
}

pub fn field_labels(payload: &CanonicalPayload) -> Vec<FieldLabel> {
    PersonalField::ALL
        .into_iter()
        .map(|field| FieldLabel {
            field,
            label: payload
                .label(&field.label_keys())
                .unwrap_or_default()
                .to_string(),
            required: field.is_required(),
        })
        .collect()
}

/// Current text of every personal-info input. Country starts on the first
/// entry of [`COUNTRIES`], like a rendered dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalFields {
    values: [String; 10],
}

impl Default for PersonalFields {
    fn default() -> Self {
        let mut values: [String; 10] = Default::default();
        values[PersonalField::Country.index()] = COUNTRIES[0].value.to_string();
        Self { values }
    }
}

impl PersonalFields {
    pub fn get(&self, field: PersonalField) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SelectionError> {
        let field =
            PersonalField::from_name(name).ok_or_else(|| SelectionError::UnknownField(name.to_string()))?;

        if field == PersonalField::Country && !COUNTRIES.iter().any(|c| c.value == value) {
            return Err(SelectionError::UnknownOption {
                axis: "country",
                value: value.to_string(),
            });
        }

        self.values[field.index()] = value.to_string();
        Ok(())
    }

    pub fn to_payload(&self) -> Result<PersonalInfoPayload, SubmitError> {
        if let Some(missing) = PersonalField::ALL
            .into_iter()
            .find(|field| field.is_required() && self.get(*field).trim().is_empty())
        {
            return Err(SubmitError::MissingField(missing.name()));
        }

        let country = self.get(PersonalField::Country);
        if !COUNTRIES.iter().any(|c| c.value == country) {
            return Err(SubmitError::UnknownOption {
                field: "country",
                value: country.to_string(),
            });
        }

        let text = |field: PersonalField| self.get(field).trim().to_string();

        Ok(PersonalInfoPayload {
            email: text(PersonalField::Email),
            country: text(PersonalField::Country),
            first_name: text(PersonalField::FirstName),
            last_name: text(PersonalField::LastName),
            company: text(PersonalField::Company),
            street_name: text(PersonalField::StreetName),
            house_number: text(PersonalField::HouseNumber),
            postal_code: text(PersonalField::PostalCode),
            city: text(PersonalField::City),
            phone: text(PersonalField::Phone),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoPayload {
    pub email: String,
    pub country: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub street_name: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub phone: String,
}
