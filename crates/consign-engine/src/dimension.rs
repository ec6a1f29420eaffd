//! Grouping dimensions and their maintenance.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use consign_domain::{Brand, Category, Client, ClientPayment, Item, Ledger, NamedEntity, Vendor};

use crate::{CoreError, CoreResult};

/// Lookup table a report can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Brand,
    Vendor,
    Client,
    Category,
}

/// How to key a payment row and resolve the key's display name.
#[derive(Clone, Copy)]
pub struct DimensionDescriptor {
    pub dimension: Dimension,
    pub key: fn(&ClientPayment, &Item) -> Uuid,
    pub name: fn(&Ledger, Uuid) -> Option<String>,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Brand,
        Dimension::Vendor,
        Dimension::Client,
        Dimension::Category,
    ];

    pub fn descriptor(self) -> DimensionDescriptor {
        match self {
            Dimension::Brand => DimensionDescriptor {
                dimension: self,
                key: |_, item| item.brand_id,
                name: |ledger, id| ledger.brand(id).map(|b| b.name.clone()),
            },
            Dimension::Vendor => DimensionDescriptor {
                dimension: self,
                key: |_, item| item.vendor_id,
                name: |ledger, id| ledger.vendor(id).map(|v| v.name.clone()),
            },
            Dimension::Client => DimensionDescriptor {
                dimension: self,
                key: |payment, _| payment.client_id,
                name: |ledger, id| ledger.client(id).map(|c| c.name.clone()),
            },
            Dimension::Category => DimensionDescriptor {
                dimension: self,
                key: |_, item| item.category_id,
                name: |ledger, id| ledger.category(id).map(|c| c.name.clone()),
            },
        }
    }

    fn entity(self) -> &'static str {
        match self {
            Dimension::Brand => "Brand",
            Dimension::Vendor => "Vendor",
            Dimension::Client => "Client",
            Dimension::Category => "Category",
        }
    }

    fn not_found(self, id: Uuid) -> CoreError {
        match self {
            Dimension::Brand => CoreError::BrandNotFound(id),
            Dimension::Vendor => CoreError::VendorNotFound(id),
            Dimension::Client => CoreError::ClientNotFound(id),
            Dimension::Category => CoreError::CategoryNotFound(id),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entity().to_ascii_lowercase())
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "brand" => Ok(Dimension::Brand),
            "vendor" => Ok(Dimension::Vendor),
            "client" => Ok(Dimension::Client),
            "category" => Ok(Dimension::Category),
            other => Err(CoreError::Validation(format!("unknown dimension `{other}`"))),
        }
    }
}

/// Add, rename and remove brands, categories, vendors and clients.
pub struct DimensionService;

impl DimensionService {
    pub fn add_brand(ledger: &mut Ledger, name: &str) -> CoreResult<Uuid> {
        Self::validate_name(ledger, Dimension::Brand, None, name)?;
        Ok(ledger.add_brand(Brand::new(name.trim())))
    }

    pub fn add_category(ledger: &mut Ledger, name: &str) -> CoreResult<Uuid> {
        Self::validate_name(ledger, Dimension::Category, None, name)?;
        Ok(ledger.add_category(Category::new(name.trim())))
    }

    pub fn add_vendor(ledger: &mut Ledger, vendor: Vendor) -> CoreResult<Uuid> {
        Self::validate_name(ledger, Dimension::Vendor, None, &vendor.name)?;
        Ok(ledger.add_vendor(vendor))
    }

    pub fn add_client(ledger: &mut Ledger, client: Client) -> CoreResult<Uuid> {
        Self::validate_name(ledger, Dimension::Client, None, &client.name)?;
        Ok(ledger.add_client(client))
    }

    pub fn rename(ledger: &mut Ledger, dimension: Dimension, id: Uuid, name: &str) -> CoreResult<()> {
        Self::validate_name(ledger, dimension, Some(id), name)?;
        let name = name.trim().to_string();
        let slot = match dimension {
            Dimension::Brand => ledger.brands.iter_mut().find(|b| b.id == id).map(|b| &mut b.name),
            Dimension::Vendor => ledger.vendors.iter_mut().find(|v| v.id == id).map(|v| &mut v.name),
            Dimension::Client => ledger.clients.iter_mut().find(|c| c.id == id).map(|c| &mut c.name),
            Dimension::Category => ledger
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .map(|c| &mut c.name),
        };
        *slot.ok_or_else(|| dimension.not_found(id))? = name;
        ledger.touch();
        Ok(())
    }

    /// Deletes an unreferenced dimension row. Referenced rows are refused with
    /// [`CoreError::Conflict`] carrying the number of blocking references.
    pub fn remove(ledger: &mut Ledger, dimension: Dimension, id: Uuid) -> CoreResult<()> {
        let references = Self::reference_count(ledger, dimension, id);
        if references > 0 {
            return Err(CoreError::Conflict {
                entity: dimension.entity(),
                id,
                references,
            });
        }
        let removed = match dimension {
            Dimension::Brand => remove_by_id(&mut ledger.brands, id, |b| b.id),
            Dimension::Vendor => remove_by_id(&mut ledger.vendors, id, |v| v.id),
            Dimension::Client => remove_by_id(&mut ledger.clients, id, |c| c.id),
            Dimension::Category => remove_by_id(&mut ledger.categories, id, |c| c.id),
        };
        if !removed {
            return Err(dimension.not_found(id));
        }
        info!(%id, dimension = %dimension, "removed dimension row");
        ledger.touch();
        Ok(())
    }

    /// Rows that would dangle if the dimension row were deleted.
    pub fn reference_count(ledger: &Ledger, dimension: Dimension, id: Uuid) -> usize {
        match dimension {
            Dimension::Brand => ledger.items.iter().filter(|i| i.brand_id == id).count(),
            Dimension::Category => ledger.items.iter().filter(|i| i.category_id == id).count(),
            Dimension::Vendor => {
                ledger.items.iter().filter(|i| i.vendor_id == id).count()
                    + ledger.vendor_payouts.iter().filter(|p| p.vendor_id == id).count()
            }
            Dimension::Client => {
                ledger.client_payments.iter().filter(|p| p.client_id == id).count()
                    + ledger
                        .installment_plans
                        .iter()
                        .filter(|p| p.client_id == id)
                        .count()
            }
        }
    }

    fn validate_name(
        ledger: &Ledger,
        dimension: Dimension,
        exclude: Option<Uuid>,
        candidate: &str,
    ) -> CoreResult<()> {
        let normalized = candidate.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(CoreError::Validation(format!(
                "{} name cannot be empty",
                dimension.entity()
            )));
        }
        let existing: Vec<(Uuid, &str)> = match dimension {
            Dimension::Brand => ledger.brands.iter().map(|b| (b.id, b.name())).collect(),
            Dimension::Vendor => ledger.vendors.iter().map(|v| (v.id, v.name())).collect(),
            Dimension::Client => ledger.clients.iter().map(|c| (c.id, c.name())).collect(),
            Dimension::Category => ledger.categories.iter().map(|c| (c.id, c.name())).collect(),
        };
        let duplicate = existing.iter().any(|(id, name)| {
            name.trim().to_ascii_lowercase() == normalized && exclude != Some(*id)
        });
        if duplicate {
            return Err(CoreError::Validation(format!(
                "{} `{}` already exists",
                dimension.entity(),
                candidate.trim()
            )));
        }
        Ok(())
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: Uuid, key: impl Fn(&T) -> Uuid) -> bool {
    let before = rows.len();
    rows.retain(|row| key(row) != id);
    rows.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn add_rejects_duplicate_names() {
        let mut ledger = Ledger::new("Dimensions");
        DimensionService::add_brand(&mut ledger, "Chanel").expect("first add");
        let err = DimensionService::add_brand(&mut ledger, " chanel ").expect_err("duplicate");
        assert!(
            matches!(err, CoreError::Validation(ref message) if message.contains("already exists")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn remove_reports_blocking_references() {
        let mut ledger = Ledger::new("Dimensions");
        let brand = DimensionService::add_brand(&mut ledger, "Dior").unwrap();
        let category = DimensionService::add_category(&mut ledger, "Bags").unwrap();
        let vendor = DimensionService::add_vendor(&mut ledger, Vendor::new("Ines")).unwrap();
        for title in ["Saddle", "Book Tote"] {
            ledger.add_item(Item::new(title, vendor, brand, category, Utc::now()));
        }

        let err = DimensionService::remove(&mut ledger, Dimension::Brand, brand).expect_err("in use");
        match err {
            CoreError::Conflict { references, entity, .. } => {
                assert_eq!(references, 2);
                assert_eq!(entity, "Brand");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let unused = DimensionService::add_brand(&mut ledger, "Fendi").unwrap();
        DimensionService::remove(&mut ledger, Dimension::Brand, unused).expect("unused removed");
        assert!(ledger.brand(unused).is_none());
    }

    #[test]
    fn rename_missing_row_is_not_found() {
        let mut ledger = Ledger::new("Dimensions");
        let id = Uuid::new_v4();
        let err = DimensionService::rename(&mut ledger, Dimension::Client, id, "Maria").unwrap_err();
        assert!(matches!(err, CoreError::ClientNotFound(missing) if missing == id));
    }
}
