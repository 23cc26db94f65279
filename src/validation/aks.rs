//! AKS user pool and cluster network ranges.

use super::checks::{Section, Validator};
use crate::models::Ipv4;

/// The DNS service address is a fixed host offset inside the service range.
pub const MIN_SERVICE_CIDR_HOSTS: u64 = 10;

pub(super) fn check_aks(v: &mut Validator, aks: &Section, vnet_prefixes: &[Ipv4]) {
    v.non_empty_str(aks, "userPoolVmSize");
    let count = v.int(aks, "userPoolCount");
    let min_count = v.int(aks, "userPoolMinCount");
    let max_count = v.int(aks, "userPoolMaxCount");
    v.non_empty_str(aks, "userPoolLabel");

    v.at_least(count, &aks.path("userPoolCount"), 0);
    v.at_least(min_count, &aks.path("userPoolMinCount"), 0);
    v.at_least(max_count, &aks.path("userPoolMaxCount"), 0);

    if let (Some(count), Some(min), Some(max)) = (count, min_count, max_count) {
        if !(min <= count && count <= max) {
            v.error(
                &format!(
                    "{} / {} / {}",
                    aks.path("userPoolCount"),
                    aks.path("userPoolMinCount"),
                    aks.path("userPoolMaxCount")
                ),
                "must satisfy min <= count <= max",
            );
        }
    }

    let pod_cidr = v.cidr(aks, "podCidr");
    let service_cidr = v.cidr(aks, "serviceCidr");
    let service_path = aks.path("serviceCidr");

    if let Some(service) = service_cidr {
        if service.usable_hosts() < MIN_SERVICE_CIDR_HOSTS {
            v.error(
                &service_path,
                format!(
                    "needs at least {MIN_SERVICE_CIDR_HOSTS} usable addresses to derive the DNS service IP, {service} has {}",
                    service.usable_hosts()
                ),
            );
        }
        if let Some(pod) = pod_cidr {
            if pod.overlaps(&service) {
                v.error(
                    &aks.path("podCidr"),
                    format!("must not overlap {service_path} ({pod} and {service})"),
                );
            }
        }
        for vnet in vnet_prefixes.iter().filter(|vnet| vnet.overlaps(&service)) {
            v.error(
                &service_path,
                format!(
                    "must not overlap network.vnetAddressPrefixes: serviceCidr={service}, vnet={vnet}"
                ),
            );
        }
    }
}
