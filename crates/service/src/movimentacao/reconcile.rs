//! Diff between a statement's stored movements and an edited submission.

use std::collections::{HashMap, HashSet};

use models::movimentacao;

use crate::errors::ServiceError;
use crate::repository::{NovaMovimentacao, ReconciliationPlan};

/// A submitted row whose category is already resolved to an id.
/// `id == 0` marks a row to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub id: i32,
    pub row: NovaMovimentacao,
}

/// Compute the writes that turn `existing` into `submitted`.
///
/// - stored rows whose id is not submitted are deleted
/// - id `0` rows are inserted
/// - other ids overwrite the stored row; unchanged rows produce no write
///
/// Ids that are negative, repeated, or not part of the statement are rejected.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use models::{movimentacao, TipoMovimentacao};
/// use rust_decimal::Decimal;
/// use service::movimentacao::reconcile::{plan_reconciliation, ResolvedRow};
/// use service::repository::NovaMovimentacao;
///
/// let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
/// let stored = |id, valor| movimentacao::Model {
///     id, extrato_id: 7, categoria_id: 1, descricao: "x".into(),
///     tipo: TipoMovimentacao::Despesa, valor: Decimal::from(valor), data_movimentacao: day,
/// };
/// let row = |valor, categoria_id| NovaMovimentacao {
///     categoria_id, descricao: "x".into(), tipo: TipoMovimentacao::Despesa,
///     valor: Decimal::from(valor), data_movimentacao: day,
/// };
/// let plan = plan_reconciliation(
///     7,
///     &[stored(1, 10), stored(2, 20)],
///     vec![ResolvedRow { id: 1, row: row(15, 1) }, ResolvedRow { id: 0, row: row(30, 9) }],
/// ).unwrap();
/// assert_eq!(plan.deletes, vec![2]);
/// assert_eq!(plan.updates[0].valor, Decimal::from(15));
/// assert_eq!(plan.inserts[0].categoria_id, 9);
/// ```
pub fn plan_reconciliation(
    extrato_id: i32,
    existing: &[movimentacao::Model],
    submitted: Vec<ResolvedRow>,
) -> Result<ReconciliationPlan, ServiceError> {
    let stored: HashMap<i32, &movimentacao::Model> = existing.iter().map(|m| (m.id, m)).collect();
    let mut seen = HashSet::with_capacity(submitted.len());
    let mut plan = ReconciliationPlan::default();

    for ResolvedRow { id, row } in submitted {
        if id < 0 {
            return Err(ServiceError::Validation(format!("invalid movimentacao id {id}")));
        }
        if id == 0 {
            plan.inserts.push(row);
            continue;
        }
        if !seen.insert(id) {
            return Err(ServiceError::Validation(format!("movimentacao {id} submitted more than once")));
        }
        let Some(old) = stored.get(&id) else {
            return Err(ServiceError::Validation(format!(
                "movimentacao {id} does not belong to extrato {extrato_id}"
            )));
        };
        let new = row.into_model(id, extrato_id);
        if new != **old {
            plan.updates.push(new);
        }
    }

    plan.deletes = existing.iter().map(|m| m.id).filter(|id| !seen.contains(id)).collect();
    Ok(plan)
}
