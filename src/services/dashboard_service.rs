use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::registrations_repo::{self, RegistrationEdit};
use crate::database::gallery_repo;
use crate::error::AppError;
use crate::models::{GalleryItemRow, RegistrationRow, RegistrationStatsRow, RegistrationStatus};

const SEX_MALE: &str = "Masculino";
const SEX_FEMALE: &str = "Feminino";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub paid: usize,
    pub pending: usize,
    pub boys: usize,
    pub girls: usize,
}

pub struct DashboardData {
    pub registrations: Vec<RegistrationRow>,
    pub gallery: Vec<GalleryItemRow>,
    pub stats: DashboardStats,
    pub filter: Option<RegistrationStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DashboardQuery {
    #[serde(default, rename = "filtro")]
    pub filter: Option<String>,
}

impl DashboardQuery {
    /// Empty or unknown filters show everything.
    pub fn status_filter(&self) -> Option<RegistrationStatus> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .and_then(|f| f.parse().ok())
    }
}

/// Admin edit form; every field is overwritten, status included.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditRegistrationForm {
    #[serde(default, rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default, rename = "sexo")]
    pub sex: String,
    #[serde(default, rename = "congregacao")]
    pub congregation: String,
    #[serde(default, rename = "telefone")]
    pub phone: String,
    #[serde(default)]
    pub status: String,
}

/// Runs the filtered list, the gallery and the counter projection concurrently.
pub async fn load_dashboard(
    pool: &SqlitePool,
    filter: Option<RegistrationStatus>,
) -> Result<DashboardData, AppError> {
    let (registrations, gallery, stats_rows) = tokio::try_join!(
        registrations_repo::list_registrations(pool, filter),
        gallery_repo::list_gallery(pool),
        registrations_repo::list_stats(pool),
    )?;

    Ok(DashboardData {
        registrations,
        gallery,
        stats: compute_stats(&stats_rows),
        filter,
    })
}

pub fn compute_stats(rows: &[RegistrationStatsRow]) -> DashboardStats {
    rows.iter().fold(DashboardStats::default(), |mut acc, row| {
        acc.total += 1;
        match row.status.parse().unwrap_or(RegistrationStatus::Pending) {
            RegistrationStatus::Paid => acc.paid += 1,
            RegistrationStatus::Pending => acc.pending += 1,
        }
        match row.sex.trim() {
            SEX_MALE => acc.boys += 1,
            SEX_FEMALE => acc.girls += 1,
            _ => {}
        }
        acc
    })
}

pub async fn edit_registration(
    pool: &SqlitePool,
    id: i64,
    form: &EditRegistrationForm,
) -> Result<(), AppError> {
    let status: RegistrationStatus = form.status.parse().map_err(AppError::BadRequest)?;
    let updated = registrations_repo::update_registration(
        pool,
        id,
        RegistrationEdit {
            name: form.name.trim(),
            cpf: form.cpf.trim(),
            sex: form.sex.trim(),
            congregation: form.congregation.trim(),
            phone: form.phone.trim(),
            status,
        },
    )
    .await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }

    info!(registration_id = id, status = %status, "registration edited by admin");
    Ok(())
}
