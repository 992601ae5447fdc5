use crate::bodies::HealthRes;

/// Simple health service that can be used by every transport
///
/// This service provides a standardised way to check the health status of the summary service.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Static method to check health without creating an instance
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "EHR summary service is alive".into(),
        }
    }
}
