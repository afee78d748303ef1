use shared::{PersonalMetricsDto, ProfileDataDto, SignupRequest, UserDto};

use crate::domain::models::{PersonalMetrics, UserRecord};
use crate::domain::SignupCommand;

/// Mapper between user DTOs and domain user records.
/// The password hash never leaves the domain.
pub struct UserMapper;

impl UserMapper {
    pub fn to_signup_command(request: SignupRequest) -> SignupCommand {
        SignupCommand {
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            role: request.role,
            password: request.password,
            patient_id: request.patient_id,
        }
    }

    pub fn to_dto(user: UserRecord) -> UserDto {
        UserDto {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role.into(),
            patient_id: user.patient_id,
            my_doctor: user.my_doctor,
            phone_number: user.phone_number,
            date_of_birth: user.date_of_birth,
            emergency_contact: user.emergency_contact,
        }
    }

    pub fn metrics_to_domain(dto: PersonalMetricsDto) -> PersonalMetrics {
        PersonalMetrics {
            weight: dto.weight,
            height: dto.height,
            blood_glucose_level: dto.blood_glucose_level,
            insulin_dosage: dto.insulin_dosage,
            allergies: dto.allergies,
        }
    }

    pub fn metrics_to_dto(metrics: PersonalMetrics) -> PersonalMetricsDto {
        PersonalMetricsDto {
            weight: metrics.weight,
            height: metrics.height,
            blood_glucose_level: metrics.blood_glucose_level,
            insulin_dosage: metrics.insulin_dosage,
            allergies: metrics.allergies,
        }
    }

    pub fn to_profile_dto(user: UserRecord, metrics: Option<PersonalMetrics>) -> ProfileDataDto {
        ProfileDataDto {
            user: Self::to_dto(user),
            personal_metrics: metrics.map(Self::metrics_to_dto),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Role;

    #[test]
    fn test_to_dto_drops_password_hash() {
        let dto = UserMapper::to_dto(UserRecord {
            username: "drsmith".into(),
            email: "smith@example.com".into(),
            full_name: "Jane Smith".into(),
            role: Role::Doctor,
            password_hash: "$argon2id$secret".into(),
            patient_id: None,
            my_doctor: None,
            phone_number: Some("+15550003333".into()),
            date_of_birth: None,
            emergency_contact: None,
        });

        assert_eq!(dto.role, "Doctor");
        let value = serde_json::to_value(&dto).unwrap();
        assert!(!value.to_string().contains("argon2"));
        assert_eq!(value["phone_number"], "+15550003333");
    }
}
