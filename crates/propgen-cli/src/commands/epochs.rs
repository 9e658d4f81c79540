use propgen_core::{DeploymentFamily, EngineEdition, EngineType, VersionEpoch};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Timeline {
    family: DeploymentFamily,
    engine_type: EngineType,
    edition: EngineEdition,
    epochs: &'static [VersionEpoch],
}

/// Lists each family's epoch timeline, oldest first.
pub fn run_epochs(format: &str) -> Result<String, serde_json::Error> {
    if format == "json" {
        let timelines: Vec<Timeline> = DeploymentFamily::ALL
            .iter()
            .map(|&family| Timeline {
                family,
                engine_type: family.engine_type(),
                edition: family.edition(),
                epochs: family.epochs(),
            })
            .collect();
        return serde_json::to_string_pretty(&timelines);
    }

    let lines: Vec<String> = DeploymentFamily::ALL
        .iter()
        .map(|family| {
            let epochs: Vec<String> = family.epochs().iter().map(|e| e.to_string()).collect();
            format!("{:<16} {}", family.as_str(), epochs.join(" "))
        })
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn human_timelines() {
        let output = run_epochs("human").unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("standalone"));
        assert!(lines[0].contains("10.50"));
        assert!(lines[0].ends_with("17.0.max"));
        assert!(lines[2].starts_with("cloud-warehouse"));
    }

    #[test]
    fn json_timelines() {
        let output = run_epochs("json").unwrap();
        let v: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(v[2]["family"], "cloud-warehouse");
        assert_eq!(v[2]["engine_type"], "cloud");
        assert_eq!(v[2]["edition"], "warehouse");
        assert_eq!(v[2]["epochs"], serde_json::json!(["10.0.max"]));
        assert_eq!(v[0]["epochs"][4], "10.50");
    }
}
