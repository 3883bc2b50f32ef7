//! Single-entity profiles: where one community would be sent under each
//! benefit scheme, and which communities one hospital serves.

use care_map_assign::nearest;
use care_map_report_models::{CommunityProfile, FacilityProfile, ProfileOption};
use care_map_spatial::RegionIndex;
use care_map_views::{ViewDefinition, ViewRegistry};

use crate::{Dataset, PipelineError, assignment_record, evaluate, prepare};

/// Views compared by [`profile_community`]: no restriction, then the
/// universal coverage, social security, and civil servant schemes.
pub const PROFILE_VIEWS: &[&str] = &[
    "default",
    "bkk_distance_uhc",
    "bkk_distance_sss",
    "bkk_distance_csmbs",
];

/// Finds the nearest eligible hospital for one community under each of
/// [`PROFILE_VIEWS`].
///
/// # Errors
///
/// Returns an error if no community has this name, or a profile view is
/// missing from the registry or cannot be compiled.
pub fn profile_community(
    dataset: &Dataset,
    registry: &ViewRegistry,
    name: &str,
) -> Result<CommunityProfile, PipelineError> {
    let community = dataset
        .community_named(name)
        .ok_or_else(|| PipelineError::UnknownCommunity(name.trim().to_owned()))?;
    let facilities = &dataset.facilities.facilities;

    let options = PROFILE_VIEWS
        .iter()
        .map(|id| -> Result<ProfileOption, PipelineError> {
            let view = registry.get(id)?;
            let predicate = view.eligibility.compile(&dataset.facilities.columns)?;
            let found = nearest(
                community.position,
                facilities.iter().filter(|f| predicate.is_eligible(f)),
            );

            Ok(ProfileOption {
                view: view.id.clone(),
                view_name: view.name.clone(),
                facility: found.map(|(id, _)| id),
                facility_name: found
                    .and_then(|(id, _)| facilities.get(id.0))
                    .map(|f| f.name.clone()),
                distance_meters: found.map(|(_, d)| d),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let region_name = RegionIndex::build(&dataset.regions)
        .locate(community.position)
        .and_then(|id| dataset.regions.iter().find(|r| r.id == id))
        .map(|r| r.name.clone());

    log::info!(
        "Profiled community {:?} against {} views",
        community.name,
        options.len()
    );

    Ok(CommunityProfile {
        community: community.id,
        name: community.name.clone(),
        position: community.position,
        population: community.population,
        region_name,
        options,
    })
}

/// The communities whose nearest eligible hospital under `view` is the
/// hospital called `name`, with the hospital's metrics and district.
///
/// The hospital is matched like districts: trimmed exact name first, then
/// case-insensitive.
///
/// # Errors
///
/// Returns an error if no hospital has this name or the view cannot run.
pub fn profile_facility(
    dataset: &Dataset,
    view: &ViewDefinition,
    name: &str,
) -> Result<FacilityProfile, PipelineError> {
    let dataset = prepare(dataset, view)?;
    let unknown = || PipelineError::UnknownFacility(name.trim().to_owned());

    let facility = dataset.facility_named(name).ok_or_else(unknown)?;
    let evaluation = evaluate(&dataset, view)?;
    let metrics = evaluation
        .aggregation
        .facilities
        .get(facility.id.0)
        .cloned()
        .ok_or_else(unknown)?;

    let communities: Vec<_> = evaluation
        .assignments
        .iter()
        .zip(&dataset.communities)
        .zip(&evaluation.aggregation.community_regions)
        .filter(|((entry, _), _)| entry.facility == Some(facility.id))
        .map(|((entry, community), region)| {
            assignment_record(&dataset, entry, community, *region)
        })
        .collect();

    log::info!(
        "Hospital {:?} serves {} communities under view {}",
        facility.name,
        communities.len(),
        view.id
    );

    Ok(FacilityProfile {
        view: view.id.clone(),
        facility: metrics,
        communities,
    })
}
