use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;

/// Text channels of a product record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    Brand,
    Category,
    SubCategory,
    Seller,
    ProductDetails,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Description,
        Field::Brand,
        Field::Category,
        Field::SubCategory,
        Field::Seller,
        Field::ProductDetails,
    ];
}

/// Already-processed tokens, one slot per text channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTokens {
    pub title: Vec<String>,
    pub description: Vec<String>,
    pub brand: Vec<String>,
    pub category: Vec<String>,
    pub sub_category: Vec<String>,
    pub seller: Vec<String>,
    pub product_details: Vec<String>,
}

impl FieldTokens {
    pub fn get(&self, field: Field) -> &[String] {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Brand => &self.brand,
            Field::Category => &self.category,
            Field::SubCategory => &self.sub_category,
            Field::Seller => &self.seller,
            Field::ProductDetails => &self.product_details,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut Vec<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Brand => &mut self.brand,
            Field::Category => &mut self.category,
            Field::SubCategory => &mut self.sub_category,
            Field::Seller => &mut self.seller,
            Field::ProductDetails => &mut self.product_details,
        }
    }

    /// Tokens of the selected fields, in field order.
    pub fn iter_fields<'a>(&'a self, fields: &'a [Field]) -> impl Iterator<Item = &'a String> + 'a {
        fields.iter().flat_map(move |f| self.get(*f).iter())
    }

    pub fn len_over(&self, fields: &[Field]) -> usize {
        fields.iter().map(|f| self.get(*f).len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericAttributes {
    pub average_rating: Option<f32>,
    /// Percentage off the list price.
    pub discount: Option<f32>,
    pub selling_price: Option<f32>,
    pub actual_price: Option<f32>,
    pub out_of_stock: Option<bool>,
}

impl NumericAttributes {
    /// Missing stock information counts as in stock.
    pub fn is_out_of_stock(&self) -> bool {
        self.out_of_stock.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// External product id.
    pub pid: String,
    pub title: String,
    pub url: Option<String>,
    pub tokens: FieldTokens,
    pub numeric: NumericAttributes,
}

/// Closed-world set of documents for one session.
///
/// Internal ids are dense and follow insertion order.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
    by_pid: HashMap<String, DocId>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents<I: IntoIterator<Item = Document>>(docs: I) -> Result<Self> {
        let mut store = Self::new();
        for doc in docs {
            store.insert(doc)?;
        }
        Ok(store)
    }

    /// Add a document and return its internal id.
    pub fn insert(&mut self, doc: Document) -> Result<DocId> {
        if self.by_pid.contains_key(&doc.pid) {
            return Err(Error::DuplicateDocument(doc.pid));
        }
        let id = self.docs.len() as DocId;
        self.by_pid.insert(doc.pid.clone(), id);
        self.docs.push(doc);
        Ok(id)
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn id_of(&self, pid: &str) -> Option<DocId> {
        self.by_pid.get(pid).copied()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.docs.iter().enumerate().map(|(i, d)| (i as DocId, d))
    }

    /// Contiguous id ranges of at most `chunk` documents, for partitioned builds.
    pub(crate) fn chunks(&self, chunk: usize) -> impl Iterator<Item = (DocId, &[Document])> {
        self.docs
            .chunks(chunk.max(1))
            .enumerate()
            .map(move |(i, c)| ((i * chunk.max(1)) as DocId, c))
    }
}

#[cfg(test)]
pub(crate) fn doc(pid: &str, title: &[&str]) -> Document {
    Document {
        pid: pid.to_string(),
        title: title.join(" "),
        url: None,
        tokens: FieldTokens {
            title: title.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
        numeric: NumericAttributes::default(),
    }
}
