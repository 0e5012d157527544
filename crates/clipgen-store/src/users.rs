//! DynamoDB repository for user accounts.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::info;

use clipgen_models::User;

use crate::attr::{get, require, Item, ToAttributeValue};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::metrics::observe;
use crate::repos::UserRepository;

/// Users table backed by DynamoDB.
#[derive(Clone)]
pub struct DynamoUserRepository {
    client: Client,
    table_name: String,
    email_index: String,
}

impl DynamoUserRepository {
    pub fn new(client: Client, config: &StoreConfig) -> Self {
        Self {
            client,
            table_name: config.users_table.clone(),
            email_index: config.email_index.clone(),
        }
    }
}

#[async_trait]
impl UserRepository for DynamoUserRepository {
    async fn get(&self, id: &str) -> StoreResult<Option<User>> {
        observe("users.get", async {
            let resp = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("GetItem", e))?;

            resp.item.as_ref().map(item_to_user).transpose()
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        observe("users.find_by_email", async {
            let resp = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.email_index)
                .key_condition_expression("email = :email")
                .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
                .limit(1)
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("Query", e))?;

            resp.items
                .unwrap_or_default()
                .first()
                .map(item_to_user)
                .transpose()
        })
        .await
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        observe("users.create", async {
            let result = self
                .client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(user_to_item(user)))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await;

            match result {
                Ok(_) => {
                    info!(user_id = %user.id, "Created user");
                    Ok(())
                }
                Err(e)
                    if e.as_service_error()
                        .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
                {
                    Err(StoreError::AlreadyExists(user.id.clone()))
                }
                Err(e) => Err(StoreError::from_sdk("PutItem", e)),
            }
        })
        .await
    }

    async fn get_credits(&self, id: &str) -> StoreResult<i64> {
        observe("users.get_credits", async {
            let resp = self
                .client
                .get_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(id.to_string()))
                .projection_expression("credits")
                .send()
                .await
                .map_err(|e| StoreError::from_sdk("GetItem", e))?;

            Ok(resp
                .item
                .as_ref()
                .and_then(|item| get::<i64>(item, "credits"))
                .unwrap_or(0))
        })
        .await
    }
}

pub fn user_to_item(user: &User) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), user.id.to_attr());
    item.insert("email".into(), user.email.to_attr());
    item.insert("name".into(), user.name.to_attr());
    item.insert("image".into(), user.image.to_attr());
    item.insert("createdAt".into(), user.created_at.to_attr());
    item.insert("provider".into(), user.provider.to_attr());
    item
}

pub fn item_to_user(item: &Item) -> StoreResult<User> {
    Ok(User {
        id: require(item, "id")?,
        email: require(item, "email")?,
        name: get(item, "name"),
        image: get(item, "image"),
        created_at: get(item, "createdAt").unwrap_or_default(),
        provider: get(item, "provider").unwrap_or_default(),
        credits: get(item, "credits").unwrap_or(0),
    })
}
