//! Background jobs. Call `spawn_all` once during startup.

use crate::config::RegistrationConfig;
use crate::services::PaymentService;

/// Spawn all background tasks; returns immediately.
///
/// The reconciliation sweep recomputes every registration status from its payments and
/// corrects any drift left by an interrupted write or an out-of-band edit.
pub fn spawn_all(registration_config: &RegistrationConfig, payment_service: PaymentService) {
    let interval = registration_config.reconcile_interval_secs;
    if interval == 0 {
        log::info!("Registration reconciliation sweep disabled");
        return;
    }

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(interval)).await;
            match payment_service.reconcile_all().await {
                Ok(report) if report.corrected > 0 => log::warn!(
                    "Reconciliation corrected {} of {} registrations",
                    report.corrected,
                    report.examined
                ),
                Ok(report) => log::debug!("Reconciliation checked {} registrations", report.examined),
                Err(e) => log::error!("Failed to reconcile registrations: {e:?}"),
            }
        }
    });
}
