use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::{CompanyId, ProductId, TransferId, TransferState, WarehouseId};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    #[serde(rename = "estado")]
    pub state: TransferState,
    #[serde(rename = "almacen_origen")]
    pub origin_warehouse: WarehouseId,
    #[serde(
        rename = "almacen_origen_nombre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_warehouse_name: Option<String>,
    #[serde(rename = "almacen_destino")]
    pub destination_warehouse: WarehouseId,
    #[serde(
        rename = "almacen_destino_nombre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_warehouse_name: Option<String>,
    #[serde(rename = "producto")]
    pub product: ProductId,
    #[serde(
        rename = "producto_nombre",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub product_name: Option<String>,
    #[serde(rename = "cantidad_enviada", deserialize_with = "quantity")]
    pub sent_quantity: f64,
    #[serde(
        rename = "cantidad_recibida",
        default,
        deserialize_with = "optional_quantity"
    )]
    pub received_quantity: Option<f64>,
    #[serde(rename = "fecha_envio")]
    pub sent_at: DateTime<Utc>,
    #[serde(
        rename = "fecha_recepcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "notas_recepcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reception_notes: Option<String>,
}

impl Transfer {
    pub fn origin_display(&self) -> String {
        self.origin_warehouse_name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.origin_warehouse))
    }

    pub fn destination_display(&self) -> String {
        self.destination_warehouse_name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.destination_warehouse))
    }

    pub fn product_display(&self) -> String {
        self.product_name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.product))
    }
}

/// Filter applied to the transfer listing. Company and destination are mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFilter {
    pub company: CompanyId,
    pub destination_warehouse: WarehouseId,
    pub origin_warehouse: Option<WarehouseId>,
    pub state: Option<TransferState>,
    pub search: Option<String>,
    pub sent_from: Option<NaiveDate>,
    pub sent_to: Option<NaiveDate>,
}

impl TransferFilter {
    pub fn new(company: CompanyId, destination_warehouse: WarehouseId) -> Self {
        Self {
            company,
            destination_warehouse,
            origin_warehouse: None,
            state: None,
            search: None,
            sent_from: None,
            sent_to: None,
        }
    }
}

/// One page request against `GET transferencias/`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferQuery {
    pub page: u32,
    pub page_size: u32,
    pub filter: TransferFilter,
}

impl TransferQuery {
    pub fn first_page(filter: TransferFilter, page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            filter,
        }
    }

    /// Query parameters in the order they are sent on the wire.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let filter = &self.filter;
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("page_size", self.page_size.to_string()),
            ("empresa", filter.company.to_string()),
            ("almacen_destino", filter.destination_warehouse.to_string()),
        ];
        if let Some(origin) = filter.origin_warehouse {
            pairs.push(("almacen_origen", origin.to_string()));
        }
        if let Some(state) = filter.state {
            pairs.push(("estado", state.wire_name().to_string()));
        }
        if let Some(search) = &filter.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(from) = filter.sent_from {
            pairs.push(("fecha_envio_gte", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = filter.sent_to {
            pairs.push(("fecha_envio_lte", to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            count: 0,
        }
    }
}

/// Body of `POST transferencias/{id}/recibir/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiveTransferRequest {
    #[serde(rename = "cantidad_recibida")]
    pub received_quantity: f64,
    #[serde(rename = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        rename = "fecha_recepcion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    #[serde(rename = "nombre")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub id: WarehouseId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "empresa", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyId>,
}

/// Reference endpoints answer either with a bare list or with a paginated envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListOrPage<T> {
    List(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> ListOrPage<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListOrPage::List(items) => items,
            ListOrPage::Page { results } => results,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireQuantity {
    Number(f64),
    Text(String),
}

impl WireQuantity {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            WireQuantity::Number(value) => Ok(value),
            WireQuantity::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid quantity '{text}'"))),
        }
    }
}

fn quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    WireQuantity::deserialize(deserializer)?.into_f64::<D::Error>()
}

fn optional_quantity<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<WireQuantity>::deserialize(deserializer)?
        .map(|value| value.into_f64::<D::Error>())
        .transpose()
}
