//! DynamoDB repository for styling presets.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{info, warn};

use clipgen_models::{Preset, PresetId};

use crate::attr::{attr_to_json, get, json_to_attr, require, Item, ToAttributeValue};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metrics::observe;
use crate::repos::PresetRepository;

/// Presets table backed by DynamoDB.
#[derive(Clone)]
pub struct DynamoPresetRepository {
    client: Client,
    table_name: String,
    user_index: String,
}

impl DynamoPresetRepository {
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            table_name: config.presets_table.clone(),
            user_index: config.user_index.clone(),
        }
    }
}

#[async_trait]
impl PresetRepository for DynamoPresetRepository {
    async fn create(&self, preset: &Preset) -> StoreResult<()> {
        observe("presets.create", async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(preset_to_item(preset)))
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("PutItem", e))?;
            info!(preset_id = %preset.id, user_id = %preset.user_id, "Created preset");
            Ok(())
        })
        .await
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<Preset>> {
        observe("presets.list_by_user", async {
            let mut presets = Vec::new();
            let mut start_key: Option<Item> = None;

            loop {
                let resp = self
                    .client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.user_index)
                    .key_condition_expression("userId = :uid")
                    .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
                    .scan_index_forward(false)
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| StoreError::from_sdk("Query", e))?;

                for item in resp.items.unwrap_or_default() {
                    match item_to_preset(&item) {
                        Ok(preset) => presets.push(preset),
                        Err(e) => warn!(user_id = %user_id, "Skipping malformed preset item: {}", e),
                    }
                }

                match resp.last_evaluated_key {
                    Some(key) if !key.is_empty() => start_key = Some(key),
                    _ => break,
                }
            }

            Ok(presets)
        })
        .await
    }
}

pub fn preset_to_item(preset: &Preset) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), preset.id.as_str().to_attr());
    item.insert("userId".into(), preset.user_id.to_attr());
    item.insert("compositionId".into(), preset.composition_id.to_attr());
    item.insert("name".into(), preset.name.to_attr());
    item.insert("description".into(), preset.description.to_attr());
    item.insert("inputProps".into(), json_to_attr(&preset.input_props));
    item.insert("createdAt".into(), preset.created_at.to_attr());
    if let Some(updated_at) = preset.updated_at {
        item.insert("updatedAt".into(), updated_at.to_attr());
    }
    item
}

pub fn item_to_preset(item: &Item) -> StoreResult<Preset> {
    Ok(Preset {
        id: PresetId(require(item, "id")?),
        user_id: require(item, "userId")?,
        composition_id: get(item, "compositionId").unwrap_or_default(),
        name: get(item, "name").unwrap_or_default(),
        description: get(item, "description").unwrap_or_default(),
        input_props: item
            .get("inputProps")
            .map(attr_to_json)
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        created_at: get(item, "createdAt").unwrap_or_default(),
        updated_at: get(item, "updatedAt"),
    })
}
