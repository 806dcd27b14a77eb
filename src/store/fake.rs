//! Scripted [`RemoteStore`] double that records every call.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::model::{Bill, Credentials, NewUser, StoredFile};

use super::{BillUpdate, BillUpload, CreateHeaders, LoginResponse, RemoteStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login(Credentials),
    CreateUser(NewUser),
    ListBills(Option<String>),
    CreateBill(BillUpload, CreateHeaders),
    UpdateBill(BillUpdate),
}

#[derive(Default)]
pub struct FakeStore {
    calls: Mutex<Vec<Call>>,
    logins: Mutex<VecDeque<Result<LoginResponse, StoreError>>>,
    create_user: Mutex<Option<StoreError>>,
    bills: Mutex<Vec<Bill>>,
    list_error: Mutex<Option<StoreError>>,
    stored_file: Mutex<Option<Result<StoredFile, StoreError>>>,
    update_error: Mutex<Option<StoreError>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue login outcomes; once drained every login is unauthorized.
    pub fn with_logins(self, outcomes: Vec<Result<LoginResponse, StoreError>>) -> Self {
        *self.logins.lock().unwrap() = outcomes.into();
        self
    }

    pub fn with_create_user_error(self, err: StoreError) -> Self {
        *self.create_user.lock().unwrap() = Some(err);
        self
    }

    pub fn with_bills(self, bills: Vec<Bill>) -> Self {
        *self.bills.lock().unwrap() = bills;
        self
    }

    pub fn with_list_error(self, err: StoreError) -> Self {
        *self.list_error.lock().unwrap() = Some(err);
        self
    }

    pub fn with_stored_file(self, outcome: Result<StoredFile, StoreError>) -> Self {
        *self.stored_file.lock().unwrap() = Some(outcome);
        self
    }

    pub fn with_update_error(self, err: StoreError) -> Self {
        *self.update_error.lock().unwrap() = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, StoreError> {
        self.record(Call::Login(credentials.clone()));
        self.logins
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(StoreError::Unauthorized))
    }

    async fn create_user(&self, data: &NewUser) -> Result<(), StoreError> {
        self.record(Call::CreateUser(data.clone()));
        match self.create_user.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_bills(&self, jwt: Option<&str>) -> Result<Vec<Bill>, StoreError> {
        self.record(Call::ListBills(jwt.map(str::to_string)));
        match self.list_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(self.bills.lock().unwrap().clone()),
        }
    }

    async fn create_bill(
        &self,
        _jwt: Option<&str>,
        upload: BillUpload,
        headers: CreateHeaders,
    ) -> Result<StoredFile, StoreError> {
        self.record(Call::CreateBill(upload, headers));
        self.stored_file.lock().unwrap().clone().unwrap_or(Ok(StoredFile {
            file_url: None,
            key: None,
        }))
    }

    async fn update_bill(
        &self,
        _jwt: Option<&str>,
        update: &BillUpdate,
    ) -> Result<Bill, StoreError> {
        self.record(Call::UpdateBill(update.clone()));
        match self.update_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(update.data.clone()),
        }
    }
}
