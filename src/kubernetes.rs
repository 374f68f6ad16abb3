//! Kubernetes manifest generation
//!
//! Manifests are plain `serde_json::Value` documents; [`ManifestSet::to_yaml`] renders
//! them as one multi-document YAML stream for `kubectl apply -f -`.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerResources {
    pub cpu_request: String,
    pub memory_request: String,
    pub cpu_limit: String,
    pub memory_limit: String,
}

impl Default for ContainerResources {
    fn default() -> Self {
        Self {
            cpu_request: "100m".to_string(),
            memory_request: "128Mi".to_string(),
            cpu_limit: "500m".to_string(),
            memory_limit: "512Mi".to_string(),
        }
    }
}

/// Everything needed to run one application in a cluster
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadSpec {
    pub name: String,
    pub image: String,
    pub port: u16,
    pub replicas: u32,
    pub env: BTreeMap<String, String>,
    /// Requests and limits are only emitted when set
    pub resources: Option<ContainerResources>,
    /// Ingress host; `{name}.local` when absent
    pub host: Option<String>,
    /// TLS secret name for the ingress
    pub tls_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub kind: String,
    pub name: String,
    pub document: Value,
}

impl Manifest {
    fn new(kind: &str, name: impl Into<String>, document: Value) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.into(),
            document,
        }
    }

    /// `deployment/web`, as kubectl prints it
    pub fn reference(&self) -> String {
        format!("{}/{}", self.kind.to_lowercase(), self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestSet {
    pub namespace: String,
    pub manifests: Vec<Manifest>,
}

impl ManifestSet {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let docs = self
            .manifests
            .iter()
            .map(|m| serde_yaml::to_string(&m.document))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(docs.join("---\n"))
    }
}

fn labels(name: &str) -> Value {
    json!({ "app": name, "version": "v1" })
}

pub fn deployment(spec: &WorkloadSpec, namespace: &str) -> Manifest {
    let env: Vec<Value> = spec
        .env
        .iter()
        .map(|(k, v)| json!({ "name": k, "value": v }))
        .collect();

    let mut container = json!({
        "name": spec.name,
        "image": spec.image,
        "ports": [{ "name": "http", "containerPort": spec.port }],
        "env": env,
    });

    if let Some(resources) = &spec.resources {
        container["resources"] = json!({
            "requests": { "memory": resources.memory_request, "cpu": resources.cpu_request },
            "limits": { "memory": resources.memory_limit, "cpu": resources.cpu_limit },
        });
    }

    Manifest::new(
        "Deployment",
        spec.name.clone(),
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": spec.name, "namespace": namespace, "labels": labels(&spec.name) },
            "spec": {
                "replicas": spec.replicas,
                "selector": { "matchLabels": { "app": spec.name } },
                "template": {
                    "metadata": { "labels": labels(&spec.name) },
                    "spec": { "containers": [container] },
                },
            },
        }),
    )
}

pub fn service(spec: &WorkloadSpec, namespace: &str) -> Manifest {
    let name = format!("{}-service", spec.name);
    Manifest::new(
        "Service",
        name.clone(),
        json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": name, "namespace": namespace, "labels": labels(&spec.name) },
            "spec": {
                "type": "ClusterIP",
                "selector": { "app": spec.name },
                "ports": [{ "name": "http", "port": 80, "targetPort": "http", "protocol": "TCP" }],
            },
        }),
    )
}

pub fn ingress(spec: &WorkloadSpec, namespace: &str) -> Manifest {
    let name = format!("{}-ingress", spec.name);
    let host = spec
        .host
        .clone()
        .unwrap_or_else(|| format!("{}.local", spec.name));

    let mut body = json!({
        "rules": [{
            "host": host,
            "http": {
                "paths": [{
                    "path": "/",
                    "pathType": "Prefix",
                    "backend": {
                        "service": { "name": format!("{}-service", spec.name), "port": { "number": 80 } }
                    },
                }],
            },
        }],
    });

    if let Some(secret) = &spec.tls_secret {
        body["tls"] = json!([{ "hosts": [host], "secretName": secret }]);
    }

    Manifest::new(
        "Ingress",
        name.clone(),
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": { "name": name, "namespace": namespace, "labels": labels(&spec.name) },
            "spec": body,
        }),
    )
}

/// `autoscaling/v2` HorizontalPodAutoscaler targeting the named deployment
pub fn horizontal_pod_autoscaler(
    deployment: &str,
    namespace: &str,
    min_replicas: u32,
    max_replicas: u32,
    target_cpu: u32,
    target_memory: Option<u32>,
) -> Manifest {
    let name = format!("{}-hpa", deployment);
    let utilization = |resource: &str, target: u32| {
        json!({
            "type": "Resource",
            "resource": {
                "name": resource,
                "target": { "type": "Utilization", "averageUtilization": target },
            },
        })
    };

    let mut metrics = vec![utilization("cpu", target_cpu)];
    if let Some(memory) = target_memory {
        metrics.push(utilization("memory", memory));
    }

    Manifest::new(
        "HorizontalPodAutoscaler",
        name.clone(),
        json!({
            "apiVersion": "autoscaling/v2",
            "kind": "HorizontalPodAutoscaler",
            "metadata": { "name": name, "namespace": namespace },
            "spec": {
                "scaleTargetRef": { "apiVersion": "apps/v1", "kind": "Deployment", "name": deployment },
                "minReplicas": min_replicas,
                "maxReplicas": max_replicas,
                "metrics": metrics,
            },
        }),
    )
}

/// Deployment, service and ingress for one workload
pub fn workload_manifests(spec: &WorkloadSpec, namespace: &str) -> ManifestSet {
    ManifestSet {
        namespace: namespace.to_string(),
        manifests: vec![
            deployment(spec, namespace),
            service(spec, namespace),
            ingress(spec, namespace),
        ],
    }
}
