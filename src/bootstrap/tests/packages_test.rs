//! Integration tests for the Crossplane demo package definitions.

use bootstrap::{PackageKind, DEMO_PACKAGES};

#[test]
fn test_demo_packages() {
    assert_eq!(DEMO_PACKAGES.len(), 3);
    assert_eq!(DEMO_PACKAGES[0].name, "provider-kubernetes");
    assert_eq!(DEMO_PACKAGES[1].name, "provider-helm");
    assert_eq!(DEMO_PACKAGES[2].name, "function-patch-and-transform");
}

#[test]
fn test_package_ordering() {
    let mut last_order = isize::MIN;
    for spec in DEMO_PACKAGES {
        assert!(
            spec.order > last_order,
            "package {} out of order",
            spec.name
        );
        last_order = spec.order;
    }

    // Providers install before functions
    let first_function = DEMO_PACKAGES
        .iter()
        .position(|s| s.kind == PackageKind::Function)
        .unwrap();
    assert!(DEMO_PACKAGES[..first_function]
        .iter()
        .all(|s| s.kind == PackageKind::Provider));
}

#[test]
fn test_package_references_are_pinned() {
    for spec in DEMO_PACKAGES {
        let (_, tag) = spec
            .package
            .rsplit_once(':')
            .unwrap_or_else(|| panic!("package {} has no tag", spec.name));
        assert!(
            tag.starts_with('v'),
            "package {} is not version-pinned: {}",
            spec.name,
            spec.package
        );
        assert_ne!(tag, "latest");
    }
}

#[test]
fn test_package_kind_resources() {
    assert_eq!(
        PackageKind::Provider.resource_prefix(),
        "provider.pkg.crossplane.io"
    );
    assert_eq!(
        PackageKind::Function.resource_prefix(),
        "function.pkg.crossplane.io"
    );
    assert_eq!(PackageKind::Provider.template(), "crossplane/provider.yaml.j2");
    assert_eq!(PackageKind::Function.template(), "crossplane/function.yaml.j2");
}
