//! Applies simulation results to a contract invocation before signing.

use stellar_xdr::curr::{
    Operation, OperationBody, SorobanAuthorizationEntry, SorobanTransactionData, Transaction,
    TransactionExt,
};

use super::encoding::from_base64_xdr;
use crate::domain::{SimulationResult, ValidationError};

/// Attach resource data and fees from a simulation.
///
/// The resource fee is added on top of the inclusion fee. Simulated auth
/// entries are attached to the first invocation only when it carries none.
pub fn apply_simulation(
    mut tx: Transaction,
    simulation: &SimulationResult,
) -> Result<Transaction, ValidationError> {
    let data: SorobanTransactionData = from_base64_xdr(&simulation.transaction_data)?;
    let resource_fee = u32::try_from(simulation.min_resource_fee).map_err(|_| {
        ValidationError::Simulation(format!(
            "resource fee {} out of range",
            simulation.min_resource_fee
        ))
    })?;
    tx.fee = tx
        .fee
        .checked_add(resource_fee)
        .ok_or_else(|| ValidationError::Simulation("fee overflow".to_string()))?;
    tx.ext = TransactionExt::V1(data);

    if simulation.auth.is_empty() {
        return Ok(tx);
    }

    let mut operations = tx.operations.to_vec();
    if let Some(Operation {
        body: OperationBody::InvokeHostFunction(invoke),
        ..
    }) = operations.first_mut()
    {
        if invoke.auth.is_empty() {
            let entries = simulation
                .auth
                .iter()
                .map(|entry| from_base64_xdr::<SorobanAuthorizationEntry>(entry))
                .collect::<Result<Vec<_>, _>>()?;
            invoke.auth = entries.try_into()?;
        }
    }
    tx.operations = operations.try_into()?;
    Ok(tx)
}
