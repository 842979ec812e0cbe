//! Built-in manifest for the edge-health add-on
//!
//! Placeholders: `edge_health_image`, `virtual_addr`.

/// Logical manifest name of the edge-health add-on
pub const EDGE_HEALTH: &str = "edge-health";

/// Default edge-health manifest: the edge-system namespace (shared with the
/// tunnel add-on; apply is create-or-update so double-submission is fine),
/// check configuration, and the per-node health daemon.
pub const EDGE_HEALTH_YAML: &str = r#"---
apiVersion: v1
kind: Namespace
metadata:
  name: edge-system
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: edge-health-conf
  namespace: edge-system
data:
  edge-health.yaml: |
    check:
      period-seconds: 10
      unhealthy-threshold: 3
      plugins:
        - kubelet-ping
        - node-ping
    communication:
      virtual-addr: {{ virtual_addr }}
      server-port: 51005
---
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: edge-health
  namespace: edge-system
  labels:
    app: edge-health
spec:
  selector:
    matchLabels:
      app: edge-health
  template:
    metadata:
      labels:
        app: edge-health
    spec:
      hostNetwork: true
      nodeSelector:
        superedge.io/edge-node: enable
      tolerations:
        - effect: NoSchedule
          operator: Exists
      containers:
        - name: edge-health
          image: {{ edge_health_image }}
          command:
            - /usr/local/bin/edge-health
          args:
            - --c=/etc/edge-health/edge-health.yaml
            - --hostname=$(NODE_NAME)
          env:
            - name: NODE_NAME
              valueFrom:
                fieldRef:
                  fieldPath: spec.nodeName
          resources:
            requests:
              cpu: 20m
              memory: 32Mi
            limits:
              cpu: 100m
              memory: 128Mi
          volumeMounts:
            - name: conf
              mountPath: /etc/edge-health
      volumes:
        - name: conf
          configMap:
            name: edge-health-conf
"#;
