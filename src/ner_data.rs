/// NerData: exports a whole collection as a `Table`
///
/// Every load renames `Sentence #` to `Sentence`, turns the `na` sentinel into
/// a missing value and drops the database `_id` field. Nothing is paginated or
/// projected, so the collection must fit in memory.

use std::sync::Arc;
use tracing::{debug, info};

use crate::document_store::DocumentSource;
use crate::error::Result;
use crate::table::Table;

pub const SENTENCE_SOURCE_COLUMN: &str = "Sentence #";
pub const SENTENCE_COLUMN: &str = "Sentence";
pub const MISSING_SENTINEL: &str = "na";
pub const ID_COLUMN: &str = "_id";

pub struct NerData {
    source: Arc<dyn DocumentSource>,
}

impl NerData {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self { source }
    }

    /// Load `collection` from `database`, or from the source's default
    /// database when `database` is `None`.
    pub async fn export_collection_as_table(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<Table> {
        let database = database.unwrap_or_else(|| self.source.default_database());
        info!("Exporting collection {}.{}", database, collection);

        let records = self.source.fetch_all(database, collection).await?;
        let mut table = Table::from_records(records);

        table.drop_column(ID_COLUMN);
        if table.rename_column(SENTENCE_SOURCE_COLUMN, SENTENCE_COLUMN) {
            debug!("Renamed column '{}' to '{}'", SENTENCE_SOURCE_COLUMN, SENTENCE_COLUMN);
        }
        let replaced = table.replace_with_missing(MISSING_SENTINEL);
        debug!("Replaced {} '{}' cells with missing values", replaced, MISSING_SENTINEL);

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::{InMemoryDocumentSource, Record};
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_sentence_rename_and_na_substitution() {
        let source = Arc::new(InMemoryDocumentSource::new("ner-mlops"));
        source.insert_many(
            "ner-mlops",
            "ner-mlops-data",
            records(vec![
                json!({"_id": {"$oid": "65f0c0ffee0000000000000a"}, "Sentence #": 1, "Word": "He", "Tag": "O"}),
                json!({"_id": {"$oid": "65f0c0ffee0000000000000b"}, "Sentence #": "na", "Word": "left", "Tag": "O"}),
            ]),
        );

        let table = NerData::new(source)
            .export_collection_as_table("ner-mlops-data", None)
            .await
            .unwrap();

        assert_eq!(table.columns(), &["Sentence", "Word", "Tag"]);
        assert_eq!(table.column("Sentence").unwrap(), vec![&json!(1), &Value::Null]);
        assert!(!table.has_column("Sentence #"));
    }

    #[tokio::test]
    async fn test_explicit_database_override() {
        let source = Arc::new(InMemoryDocumentSource::new("ner-mlops"));
        source.insert_many(
            "archive",
            "ner-mlops-data",
            records(vec![json!({"Word": "na", "Tag": "B-geo"})]),
        );

        let data = NerData::new(source);
        let default_db = data
            .export_collection_as_table("ner-mlops-data", None)
            .await
            .unwrap();
        assert_eq!(default_db.num_rows(), 0);

        let archive = data
            .export_collection_as_table("ner-mlops-data", Some("archive"))
            .await
            .unwrap();
        assert_eq!(archive.shape(), (1, 2));
        assert_eq!(archive.column("Word").unwrap(), vec![&Value::Null]);
    }
}
