//! Sample QMS rows for in-memory mode.
//!
//! One flat row set covers the inventory, testing and production-tracking
//! columns the bundled rules select, so every sample rule has something
//! to show. The mock store filters on whichever entities a query binds.

use serde_json::{Value, json};

use ql_engine::MockDataStore;
use ql_protocol::Row;

/// (supplier, material, factory, status, batch, test result, defect rate)
const LOTS: &[(&str, &str, &str, &str, &str, &str, f64)] = &[
    ("聚龙", "电池盖", "重庆工厂", "正常", "105112", "合格", 0.012),
    ("聚龙", "中框", "深圳工厂", "风险", "105113", "不合格", 0.048),
    ("欣冠", "电池盖", "重庆工厂", "正常", "105201", "合格", 0.008),
    ("欣冠", "手机卡托", "南昌工厂", "冻结", "105202", "不合格", 0.063),
    ("广正", "侧键", "宜宾工厂", "正常", "105310", "合格", 0.004),
    ("BOE", "LCD显示屏", "重庆工厂", "正常", "105401", "合格", 0.015),
    ("BOE", "OLED显示屏", "深圳工厂", "风险", "105402", "不合格", 0.052),
    ("天马", "LCD显示屏", "南昌工厂", "正常", "105501", "合格", 0.011),
    ("华星", "OLED显示屏", "宜宾工厂", "正常", "105601", "合格", 0.009),
    ("盛泰", "电池", "重庆工厂", "冻结", "105701", "不合格", 0.071),
    ("天实", "摄像头", "深圳工厂", "正常", "105801", "合格", 0.006),
    ("百俊达", "喇叭", "南昌工厂", "正常", "105901", "合格", 0.010),
    ("奥海", "听筒", "宜宾工厂", "风险", "106001", "不合格", 0.039),
];

/// The sample rows, in a stable order.
pub fn sample_rows() -> Vec<Row> {
    LOTS.iter()
        .enumerate()
        .filter_map(|(i, &(supplier, material, factory, status, batch, result, rate))| {
            let day = i + 1;
            let expiry = match status {
                "冻结" => Value::Null,
                _ => json!(format!("2025-05-{day:02}")),
            };
            let notes = match status {
                "风险" => json!("待复检"),
                _ => Value::Null,
            };
            let defect = match result {
                "不合格" => json!("外观划伤"),
                _ => Value::Null,
            };
            let anomaly = rate > 0.03;
            let value = json!({
                "factory_name": factory,
                "warehouse": format!("WH-{}", (b'A' + (i % 3) as u8) as char),
                "material_code": format!("MAT-{:04}", 1000 + i),
                "material_name": material,
                "supplier_name": supplier,
                "quantity": 500 + 250 * i,
                "status": status,
                "inbound_time": format!("2024-05-{day:02}"),
                "expiry_time": expiry,
                "notes": notes,
                "test_id": format!("T2024{:04}", 1 + i),
                "test_date": format!("2024-06-{day:02}"),
                "project": "X100",
                "baseline": "V1.2",
                "test_result": result,
                "defect_desc": defect,
                "batch_code": batch,
                "defect_rate": rate,
                "weekly_anomaly": anomaly,
                "inspection_date": format!("2024-06-{day:02}"),
            });
            match value {
                Value::Object(row) => Some(row),
                _ => None,
            }
        })
        .collect()
}

/// A mock store over [`sample_rows`], filtering on the bound entities.
pub fn sample_store() -> MockDataStore {
    MockDataStore::new(sample_rows())
        .filter_on("supplier", "supplier_name")
        .filter_on("material", "material_name")
        .filter_on("factory", "factory_name")
        .filter_on("status", "status")
        .filter_on("batch", "batch_code")
        .filter_on("result", "test_result")
}
