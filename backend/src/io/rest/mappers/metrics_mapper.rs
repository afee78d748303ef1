use shared::{GlucoseEntryDto, MealEntryDto, MetricRangeQuery, PressureEntryDto};

use crate::domain::models::{GlucoseReading, MealEntry, PressureReading, Stored, TimeRange};
use crate::domain::ServiceResult;

pub struct MetricsMapper;

impl MetricsMapper {
    pub fn to_time_range(query: &MetricRangeQuery) -> ServiceResult<TimeRange> {
        TimeRange::parse(query.start.as_deref(), query.end.as_deref())
    }

    pub fn pressure_to_dto(stored: Stored<PressureReading>) -> PressureEntryDto {
        PressureEntryDto {
            id: stored.id,
            systolic: stored.value.systolic,
            diastolic: stored.value.diastolic,
            timestamp: stored.value.timestamp,
        }
    }

    pub fn glucose_to_dto(stored: Stored<GlucoseReading>) -> GlucoseEntryDto {
        GlucoseEntryDto {
            id: stored.id,
            glucose_level: stored.value.glucose_level,
            timestamp: stored.value.timestamp,
        }
    }

    pub fn meal_to_dto(stored: Stored<MealEntry>) -> MealEntryDto {
        MealEntryDto {
            id: stored.id,
            meal: stored.value.meal,
            carbohydrates: stored.value.carbohydrates,
            calories: stored.value.calories,
            timestamp: stored.value.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceError;

    #[test]
    fn test_to_time_range() {
        let open = MetricsMapper::to_time_range(&MetricRangeQuery { start: None, end: None }).unwrap();
        assert_eq!(open, TimeRange::default());

        let bad = MetricsMapper::to_time_range(&MetricRangeQuery {
            start: Some("soon".to_string()),
            end: None,
        });
        assert!(matches!(bad, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_meal_to_dto_keeps_optional_fields() {
        let dto = MetricsMapper::meal_to_dto(Stored {
            id: "m1".to_string(),
            value: MealEntry {
                meal: "Oatmeal".to_string(),
                carbohydrates: Some(45.0),
                calories: None,
                timestamp: "2024-01-01T08:00:00.000Z".to_string(),
            },
        });

        assert_eq!(dto.id, "m1");
        assert_eq!(dto.carbohydrates, Some(45.0));
        assert_eq!(dto.calories, None);
    }

    #[test]
    fn test_pressure_to_dto() {
        let dto = MetricsMapper::pressure_to_dto(Stored {
            id: "p1".to_string(),
            value: PressureReading {
                systolic: 120.0,
                diastolic: 80.0,
                timestamp: "2024-01-01T08:00:00.000Z".to_string(),
            },
        });

        assert_eq!((dto.systolic, dto.diastolic), (120.0, 80.0));
        assert_eq!(dto.timestamp, "2024-01-01T08:00:00.000Z");
    }
}
