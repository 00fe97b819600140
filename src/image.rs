// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

use std::fmt;

/// A parsed image reference, as it appears on the right-hand side of a
/// `FROM`, a `COPY --from=`, or a `RUN --mount=...,from=` directive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageRef {
  pub registry: Option<String>,
  pub image: String,
  pub tag: Option<String>
}

/// Determines if an ImageRef token refers to a registry hostname or not
///
/// Based on rules from https://stackoverflow.com/a/42116190
fn is_registry(token: &str) -> bool {
  token == "localhost" || token.contains('.') || token.contains(':')
}

impl ImageRef {
  pub fn parse(s: &str) -> ImageRef {
    // tags may be one of:
    // foo (implies registry.hub.docker.com/library/foo:latest)
    // foo:bar (implies registry.hub.docker.com/library/foo:bar)
    // org/foo:bar (implies registry.hub.docker.com/org/foo:bar)

    // per https://stackoverflow.com/a/42116190, some extra rules are needed to
    // disambiguate external registries
    // localhost/foo:bar is allowed (localhost is special)
    // example.com/foo:bar is allowed
    // host/foo:bar is not allowed (conflicts with docker hub)
    // host:443/foo:bar is allowed (':' or '.' make it unambiguous)

    // we don't attempt to actually validate tags otherwise, so invalid
    // characters could slip through

    let parts: Vec<&str> = s.splitn(2, '/').collect();
    let (registry, image_full) = if parts.len() == 1 {
      (None, parts[0])
    } else if is_registry(parts[0]) {
      (Some(parts[0].to_string()), parts[1])
    } else {
      (None, parts[0])
    };

    // parts length is guaranteed to be at least 1 given an empty string
    let parts: Vec<&str> = image_full.splitn(2, ':').collect();
    let image = parts[0].to_string();
    let tag = parts.get(1).map(|p| String::from(*p));

    ImageRef { registry, image, tag }
  }

  /// The part of this reference used to resolve against the alias table:
  /// registry plus image name, tag stripped. Only a reference with no
  /// registry component can ever match a locally declared stage alias, since
  /// aliases are bare identifiers.
  pub fn name_without_tag(&self) -> String {
    match &self.registry {
      Some(registry) => format!("{}/{}", registry, self.image),
      None => self.image.clone()
    }
  }

  /// Whether this reference could possibly resolve to a local alias: it has
  /// no registry component (a registry-qualified reference like
  /// `example.com/foo` can never be a stage name).
  pub fn could_be_local(&self) -> bool {
    self.registry.is_none()
  }
}

impl fmt::Display for ImageRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(registry) = &self.registry {
      write!(f, "{}/", registry)?;
    }

    write!(f, "{}", self.image)?;

    if let Some(tag) = &self.tag {
      write!(f, ":{}", tag)?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_bare() {
    assert_eq!(ImageRef::parse("alpine"), ImageRef {
      registry: None,
      image: "alpine".into(),
      tag: None
    });
  }

  #[test]
  fn parse_tagged() {
    assert_eq!(ImageRef::parse("alpine:3.19"), ImageRef {
      registry: None,
      image: "alpine".into(),
      tag: Some("3.19".into())
    });
  }

  #[test]
  fn parse_registry_qualified() {
    assert_eq!(ImageRef::parse("ghcr.io/foo/bar:latest"), ImageRef {
      registry: Some("ghcr.io".into()),
      image: "foo/bar".into(),
      tag: Some("latest".into())
    });
  }

  #[test]
  fn parse_org_without_registry() {
    // 'org' isn't a registry hostname (no '.' or ':'), so the whole thing is
    // the image name under docker hub's implicit registry
    assert_eq!(ImageRef::parse("org/foo:bar"), ImageRef {
      registry: None,
      image: "org/foo".into(),
      tag: Some("bar".into())
    });
  }

  #[test]
  fn parse_port_qualified_registry() {
    assert_eq!(ImageRef::parse("registry:5000/foo:bar"), ImageRef {
      registry: Some("registry:5000".into()),
      image: "foo".into(),
      tag: Some("bar".into())
    });
  }

  #[test]
  fn name_without_tag_matches_local_alias() {
    let r = ImageRef::parse("builder:prebake");
    assert_eq!(r.name_without_tag(), "builder");
    assert!(r.could_be_local());
  }

  #[test]
  fn registry_qualified_never_local() {
    let r = ImageRef::parse("ghcr.io/builder:latest");
    assert!(!r.could_be_local());
  }
}
