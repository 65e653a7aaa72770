// src/services/catalog.rs
//! Vendor catalog texts and the scope selector that turns them into the
//! context sent with every model query.

use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};

pub const PERSONA_INSTRUCTIONS: &str = include_str!("../../catalogs/instructions.txt");
pub const EL_CASTOR_CATALOG: &str = include_str!("../../catalogs/el_castor.txt");
pub const UNGER_CATALOG: &str = include_str!("../../catalogs/unger.txt");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    ElCastor,
    Unger,
}

impl Vendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::ElCastor => "el_castor",
            Vendor::Unger => "unger",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogScope {
    ElCastor,
    Unger,
    Both,
}

impl CatalogScope {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogScope::ElCastor => "el_castor",
            CatalogScope::Unger => "unger",
            CatalogScope::Both => "both",
        }
    }

    /// Name shown to the user in the welcome message.
    pub fn label(self) -> &'static str {
        match self {
            CatalogScope::ElCastor => "El Castor",
            CatalogScope::Unger => "Unger",
            CatalogScope::Both => "Completo (El Castor e Unger)",
        }
    }

    pub fn vendors(self) -> &'static [Vendor] {
        match self {
            CatalogScope::ElCastor => &[Vendor::ElCastor],
            CatalogScope::Unger => &[Vendor::Unger],
            CatalogScope::Both => &[Vendor::ElCastor, Vendor::Unger],
        }
    }

    fn header(self) -> &'static str {
        match self {
            CatalogScope::ElCastor => "CONTEXTO: APENAS PRODUTOS EL CASTOR.",
            CatalogScope::Unger => "CONTEXTO: APENAS PRODUTOS UNGER.",
            CatalogScope::Both => "CONTEXTO: PRODUTOS EL CASTOR E UNGER (COMPARATIVO).",
        }
    }

    /// Builds the context string for this scope. Only the texts of the
    /// vendors in scope are included.
    pub fn context(self, texts: &CatalogTexts) -> String {
        let body = self
            .vendors()
            .iter()
            .map(|vendor| texts.text(*vendor))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("{PERSONA_INSTRUCTIONS}\n\n{}\n{body}", self.header())
    }
}

/// The vendor catalog texts in effect, built-in or overridden.
#[derive(Clone, Debug)]
pub struct CatalogTexts {
    pub el_castor: Cow<'static, str>,
    pub unger: Cow<'static, str>,
}

impl CatalogTexts {
    pub fn builtin() -> Self {
        Self {
            el_castor: Cow::Borrowed(EL_CASTOR_CATALOG),
            unger: Cow::Borrowed(UNGER_CATALOG),
        }
    }

    pub fn text(&self, vendor: Vendor) -> &str {
        match vendor {
            Vendor::ElCastor => &self.el_castor,
            Vendor::Unger => &self.unger,
        }
    }

    pub fn set(&mut self, vendor: Vendor, text: String) {
        match vendor {
            Vendor::ElCastor => self.el_castor = Cow::Owned(text),
            Vendor::Unger => self.unger = Cow::Owned(text),
        }
    }
}
