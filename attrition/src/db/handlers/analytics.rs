//! Read-only aggregate queries over employees and predictions.

use crate::api::models::analytics::{DashboardStats, DepartmentStats, RiskDistribution, RoleStats, SalaryRangeStats};
use crate::db::errors::Result;
use crate::inference::RiskLevel;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

/// Monthly income buckets, lower bound inclusive and upper bound exclusive.
pub const SALARY_BUCKETS: [(f64, f64, &str); 5] = [
    (0.0, 30_000.0, "0-30k"),
    (30_000.0, 60_000.0, "30k-60k"),
    (60_000.0, 90_000.0, "60k-90k"),
    (90_000.0, 120_000.0, "90k-120k"),
    (120_000.0, f64::INFINITY, "120k+"),
];

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage of `part` in `total`, two decimals, 0 for an empty group.
pub(crate) fn attrition_rate(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 2)
}

#[derive(Debug, FromRow)]
struct GroupCount {
    label: String,
    total: i64,
    attrition: i64,
}

#[derive(Debug, FromRow)]
struct DashboardRow {
    total: i64,
    attrition: i64,
    average_age: Option<f64>,
    average_salary: Option<f64>,
    average_satisfaction: Option<f64>,
}

pub struct Analytics<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Analytics<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn dashboard(&mut self) -> Result<DashboardStats> {
        let row = sqlx::query_as::<_, DashboardRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(attrition = 'Yes'), 0) AS attrition,
                AVG(age) AS average_age,
                AVG(monthly_income) AS average_salary,
                AVG(job_satisfaction) AS average_satisfaction
            FROM employees
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(DashboardStats {
            total_employees: row.total,
            attrition_rate: attrition_rate(row.attrition, row.total),
            average_age: round_to(row.average_age.unwrap_or_default(), 1),
            average_salary: round_to(row.average_salary.unwrap_or_default(), 2),
            job_satisfaction: round_to(row.average_satisfaction.unwrap_or_default(), 2),
        })
    }

    /// Per-department counts in order of first appearance.
    #[instrument(skip(self), err)]
    pub async fn by_department(&mut self) -> Result<Vec<DepartmentStats>> {
        let groups = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT
                COALESCE(department, 'Unknown') AS label,
                COUNT(*) AS total,
                COALESCE(SUM(attrition = 'Yes'), 0) AS attrition
            FROM employees
            GROUP BY COALESCE(department, 'Unknown')
            ORDER BY MIN(id)
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(groups
            .into_iter()
            .map(|g| DepartmentStats {
                attrition_rate: attrition_rate(g.attrition, g.total),
                department: g.label,
                total: g.total,
                attrition: g.attrition,
            })
            .collect())
    }

    /// Every bucket of [`SALARY_BUCKETS`], empty ones included. Unset income counts as 0.
    #[instrument(skip(self), err)]
    pub async fn by_salary(&mut self) -> Result<Vec<SalaryRangeStats>> {
        let rows: Vec<(Option<f64>, Option<String>)> =
            sqlx::query_as("SELECT monthly_income, attrition FROM employees")
                .fetch_all(&mut *self.db)
                .await?;

        let mut counts = [(0i64, 0i64); SALARY_BUCKETS.len()];
        for (income, attrition) in rows {
            let income = income.unwrap_or_default();
            let Some(bucket) = SALARY_BUCKETS
                .iter()
                .position(|(low, high, _)| *low <= income && income < *high)
            else {
                continue;
            };
            counts[bucket].0 += 1;
            if attrition.as_deref() == Some("Yes") {
                counts[bucket].1 += 1;
            }
        }

        Ok(SALARY_BUCKETS
            .iter()
            .zip(counts)
            .map(|((_, _, label), (total, attrition))| SalaryRangeStats {
                range: label.to_string(),
                total,
                attrition,
                attrition_rate: attrition_rate(attrition, total),
            })
            .collect())
    }

    /// Per-job-role counts, largest groups first.
    #[instrument(skip(self), err)]
    pub async fn by_role(&mut self) -> Result<Vec<RoleStats>> {
        let groups = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT
                COALESCE(job_role, 'Unknown') AS label,
                COUNT(*) AS total,
                COALESCE(SUM(attrition = 'Yes'), 0) AS attrition
            FROM employees
            GROUP BY COALESCE(job_role, 'Unknown')
            ORDER BY total DESC, MIN(id)
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(groups
            .into_iter()
            .map(|g| RoleStats {
                attrition_rate: attrition_rate(g.attrition, g.total),
                role: g.label,
                total: g.total,
                attrition: g.attrition,
            })
            .collect())
    }

    /// Persisted predictions per band, always listing Low, Medium and High.
    #[instrument(skip(self), err)]
    pub async fn risk_distribution(&mut self) -> Result<Vec<RiskDistribution>> {
        let rows: Vec<(RiskLevel, i64)> =
            sqlx::query_as("SELECT risk_level, COUNT(*) FROM predictions GROUP BY risk_level")
                .fetch_all(&mut *self.db)
                .await?;

        Ok(RiskLevel::ALL
            .into_iter()
            .map(|risk_level| RiskDistribution {
                risk_level,
                count: rows
                    .iter()
                    .find(|(level, _)| *level == risk_level)
                    .map(|(_, count)| *count)
                    .unwrap_or_default(),
            })
            .collect())
    }
}
