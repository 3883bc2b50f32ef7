//! Small in-memory dataset shared by the pipeline tests.
//!
//! Two districts split at longitude 100.55. Alpha (west) is the only
//! hospital flagged for CSMBS; Gamma sits next to community Three in the
//! east.

use care_map_loader::{communities_from_table, facilities_from_table, read_regions, read_table};
use care_map_report_models::ReportSection;
use care_map_views::{EligibilityRule, ViewDefinition};

use crate::Dataset;

const HOSPITALS: &str = "\
โรงพยาบาล,ละติจูด,ลองจิจูด,ประเภท,จำนวนเตียง,CSMBS
Alpha,13.751,100.501,รัฐ,120,yes
Beta,13.90,100.90,เอกชน,40,no
Gamma,13.80,100.61,รัฐ,60,
";

const COMMUNITIES: &str = "\
ชุมชน,ละติจูด,ลองจิจูด,จำนวนประชากร
One,13.75,100.50,100
Two,13.76,100.52,200
Three,13.80,100.60,300
";

fn square(name: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> String {
    format!(
        r#"{{"type":"Feature","properties":{{"amp_th":"{name}"}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},{y0}],[{x1},{y0}],[{x1},{y1}],[{x0},{y1}],[{x0},{y0}]]]}}}}"#
    )
}

pub fn dataset() -> Dataset {
    let hospitals = read_table(HOSPITALS.as_bytes(), "hospitals.csv").unwrap();
    let communities = read_table(COMMUNITIES.as_bytes(), "communities.csv").unwrap();
    let districts = format!(
        r#"{{"type":"FeatureCollection","features":[{},{}]}}"#,
        square("Ratchathewi", 100.40, 13.70, 100.55, 13.85),
        square("Pathum Wan", 100.55, 13.70, 100.95, 13.95),
    );

    Dataset {
        facilities: facilities_from_table(&hospitals).unwrap(),
        communities: communities_from_table(&communities).unwrap(),
        regions: read_regions(&districts, "districts.geojson").unwrap(),
    }
}

pub fn plain_view() -> ViewDefinition {
    ViewDefinition {
        id: "plain".to_string(),
        name: "Plain".to_string(),
        description: None,
        eligibility: EligibilityRule::Any,
        region_filter: None,
        facility_filter: None,
        sections: ReportSection::ALL.to_vec(),
    }
}

pub fn csmbs_view() -> ViewDefinition {
    ViewDefinition {
        id: "csmbs".to_string(),
        eligibility: EligibilityRule::Accepts {
            columns: vec!["สิทธิข้าราชการ".to_string(), "CSMBS".to_string()],
            keywords: vec!["ข้าราชการ".to_string()],
        },
        ..plain_view()
    }
}
