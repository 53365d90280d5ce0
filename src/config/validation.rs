use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Capacity must be positive: {field} = 0")]
    ZeroCapacity { field: &'static str },

    #[error("Service ack_timeout must be positive")]
    ZeroAckTimeout,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_events(config)?;
    validate_service(config)?;
    Ok(())
}

fn validate_events(config: &Config) -> Result<(), ValidationError> {
    if config.events.channel_capacity == 0 {
        return Err(ValidationError::ZeroCapacity {
            field: "events.channel_capacity",
        });
    }
    Ok(())
}

fn validate_service(config: &Config) -> Result<(), ValidationError> {
    if config.service.queue_capacity == 0 {
        return Err(ValidationError::ZeroCapacity {
            field: "service.queue_capacity",
        });
    }
    if config.service.ack_timeout.as_duration().is_zero() {
        return Err(ValidationError::ZeroAckTimeout);
    }
    Ok(())
}
