//! Typed CRUD clients for backend resources.
//!
//! One generic [`ResourceClient`] serves every collection under `/api/`;
//! endpoints that only exist on one resource are added as inherent methods
//! on that resource's client type.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::{ApiClient, ApiError};
use crate::models::{
    Account, Budget, BudgetProgress, Category, NewAccount, NewBudget, NewCategory,
    NewTransaction, ReportRange, Transaction, TransactionFilter, TransactionReport,
    VisualizationData,
};

/// A backend collection with the usual list/detail routes.
pub trait Resource: DeserializeOwned + Send {
    /// Collection path, with leading and trailing slash
    const PATH: &'static str;

    /// Payload accepted by create and update
    type Draft: Serialize + Sync;

    /// Client-side checks run before a draft is sent
    fn validate(_draft: &Self::Draft) -> Result<(), ApiError> {
        Ok(())
    }
}

impl Resource for Account {
    const PATH: &'static str = "/api/accounts/";
    type Draft = NewAccount;

    fn validate(draft: &NewAccount) -> Result<(), ApiError> {
        if draft.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Account name is required".to_string()));
        }
        Ok(())
    }
}

impl Resource for Category {
    const PATH: &'static str = "/api/categories/";
    type Draft = NewCategory;

    fn validate(draft: &NewCategory) -> Result<(), ApiError> {
        if draft.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Category name is required".to_string()));
        }
        Ok(())
    }
}

impl Resource for Transaction {
    const PATH: &'static str = "/api/transactions/";
    type Draft = NewTransaction;

    fn validate(draft: &NewTransaction) -> Result<(), ApiError> {
        draft.validate()
    }
}

impl Resource for Budget {
    const PATH: &'static str = "/api/budgets/";
    type Draft = NewBudget;

    fn validate(draft: &NewBudget) -> Result<(), ApiError> {
        draft.validate()
    }
}

pub struct ResourceClient<R> {
    api: ApiClient,
    base: &'static str,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            base: self.base,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(api: ApiClient, base: &'static str) -> Self {
        Self {
            api,
            base,
            _resource: PhantomData,
        }
    }

    fn item_path(&self, id: i64) -> String {
        format!("{}{}/", self.base, id)
    }

    fn action_path(&self, action: &str) -> String {
        format!("{}{}/", self.base, action)
    }

    pub async fn get_all(&self) -> Result<Vec<R>, ApiError> {
        self.api.get(self.base, Vec::new()).await
    }

    pub async fn get_one(&self, id: i64) -> Result<R, ApiError> {
        self.api.get(&self.item_path(id), Vec::new()).await
    }

    pub async fn create(&self, draft: &R::Draft) -> Result<R, ApiError> {
        R::validate(draft)?;
        self.api.post(self.base, draft).await
    }

    pub async fn update(&self, id: i64, draft: &R::Draft) -> Result<R, ApiError> {
        R::validate(draft)?;
        self.api.put(&self.item_path(id), draft).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&self.item_path(id)).await
    }
}

impl ResourceClient<Transaction> {
    /// List transactions matching `filter`
    pub async fn get_filtered(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, ApiError> {
        self.api.get(self.base, filter.to_query()).await
    }

    pub async fn report(&self, range: &ReportRange) -> Result<TransactionReport, ApiError> {
        self.api
            .get(&self.action_path("generate_report"), range.to_query())
            .await
    }

    pub async fn visualization_data(
        &self,
        filter: &TransactionFilter,
    ) -> Result<VisualizationData, ApiError> {
        self.api
            .get(&self.action_path("visualization_data"), filter.to_query())
            .await
    }
}

impl ResourceClient<Budget> {
    pub async fn progress(&self, id: i64) -> Result<BudgetProgress, ApiError> {
        self.api
            .get(&format!("{}progress/", self.item_path(id)), Vec::new())
            .await
    }
}
