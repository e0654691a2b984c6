use stockcast::application::ml::{ForecastSettings, run_forecast};
use stockcast::domain::types::Trend;

fn linear_closes() -> Vec<f64> {
    (0..100).map(|i| 100.0 + i as f64).collect()
}

fn settings() -> ForecastSettings {
    ForecastSettings {
        epochs: 5,
        seed: Some(2024),
        ..ForecastSettings::default()
    }
}

#[test]
fn test_linear_series_forecast() {
    let closes = linear_closes();
    assert_eq!(closes.first().copied(), Some(100.0));
    assert_eq!(closes.last().copied(), Some(199.0));

    let result = run_forecast("LIN", &closes, 5, &settings()).expect("forecast should succeed");

    assert_eq!(result.all_predictions.len(), 5);
    assert!(result.all_predictions.iter().all(|&p| p > 0.0 && p.is_finite()));
    assert!((50.0..=95.0).contains(&result.confidence));
    assert_eq!(result.current_price, 199.0);

    let mean3: f64 = result.all_predictions[..3].iter().sum::<f64>() / 3.0;
    assert!((result.predictions.three_day - mean3).abs() < 0.01);
    assert_eq!(result.predictions.next_week, result.all_predictions[4]);
}

#[test]
fn test_trend_matches_first_prediction() {
    let result = run_forecast("LIN", &linear_closes(), 3, &settings()).unwrap();
    let first = result.all_predictions[0];

    let expected = if first >= 199.0 * 1.01 {
        Trend::Bullish
    } else if first <= 199.0 * 0.99 {
        Trend::Bearish
    } else {
        Trend::Neutral
    };
    // Rounding to cents can only flip a value sitting within a cent of a band edge
    if (first - 199.0 * 1.01).abs() > 0.01 && (first - 199.0 * 0.99).abs() > 0.01 {
        assert_eq!(result.trend, expected);
    }
}

#[test]
fn test_prediction_json_shape() {
    let result = run_forecast("LIN", &linear_closes(), 7, &settings()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["symbol"], "LIN");
    assert!(json["currentPrice"].is_number());
    assert!(json["predictions"]["tomorrow"].is_number());
    assert!(json["predictions"]["threeDay"].is_number());
    assert!(json["predictions"]["nextWeek"].is_number());
    assert_eq!(json["allPredictions"].as_array().map(Vec::len), Some(7));
    assert!(json["trend"].is_string());
    assert!(json["recommendation"].as_str().is_some_and(|r| r.contains('–')));
    assert!(json["timestamp"].as_str().is_some_and(|t| t.contains('T')));
}
