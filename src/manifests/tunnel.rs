//! Built-in manifest for the cloud/edge tunnel add-on
//!
//! Placeholders: `tunnel_cloud_image`, `tunnel_edge_image`,
//! `master_public_addr`, `virtual_addr`.

/// Logical manifest name of the tunnel add-on
pub const TUNNEL_EDGE: &str = "tunnel-edge";

/// Default tunnel manifest: the edge-system namespace, the cloud-side
/// endpoint (config, service, deployment) and the edge-side daemon.
pub const TUNNEL_EDGE_YAML: &str = r#"---
apiVersion: v1
kind: Namespace
metadata:
  name: edge-system
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: tunnel-cloud-conf
  namespace: edge-system
data:
  tunnel_cloud.toml: |
    [mode.cloud.stream.server]
    grpc_port = 9000
    log_port = 7000
    channelz_addr = "localhost:5000"
    key = "/etc/tunnel/certs/tunnel-cloud-server.key"
    cert = "/etc/tunnel/certs/tunnel-cloud-server.crt"
    token = "BpLnfgDsc2WD8F2qNfHK5a84jjJkwzDk"
    [mode.cloud.stream.register]
    service = "tunnel-cloud"
    [mode.cloud.stream.dns]
    virtual_addr = "{{ virtual_addr }}"
---
apiVersion: v1
kind: Service
metadata:
  name: tunnel-cloud
  namespace: edge-system
spec:
  type: NodePort
  selector:
    app: tunnel-cloud
  ports:
    - name: grpc
      port: 9000
      targetPort: 9000
      nodePort: 31000
      protocol: TCP
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: tunnel-cloud
  namespace: edge-system
  labels:
    app: tunnel-cloud
spec:
  replicas: 1
  selector:
    matchLabels:
      app: tunnel-cloud
  template:
    metadata:
      labels:
        app: tunnel-cloud
    spec:
      serviceAccountName: default
      nodeSelector:
        node-role.kubernetes.io/control-plane: ""
      tolerations:
        - key: node-role.kubernetes.io/control-plane
          operator: Exists
          effect: NoSchedule
      containers:
        - name: tunnel-cloud
          image: {{ tunnel_cloud_image }}
          command:
            - /usr/local/bin/tunnel
          args:
            - --m=cloud
            - --c=/etc/tunnel/conf/tunnel_cloud.toml
            - --log-dir=/var/log/tunnel
          ports:
            - containerPort: 9000
              name: grpc
              protocol: TCP
          resources:
            requests:
              cpu: 50m
              memory: 64Mi
            limits:
              cpu: 200m
              memory: 256Mi
          volumeMounts:
            - name: conf
              mountPath: /etc/tunnel/conf
      volumes:
        - name: conf
          configMap:
            name: tunnel-cloud-conf
---
apiVersion: apps/v1
kind: DaemonSet
metadata:
  name: tunnel-edge
  namespace: edge-system
  labels:
    app: tunnel-edge
spec:
  selector:
    matchLabels:
      app: tunnel-edge
  template:
    metadata:
      labels:
        app: tunnel-edge
    spec:
      hostNetwork: true
      nodeSelector:
        superedge.io/edge-node: enable
      tolerations:
        - effect: NoSchedule
          operator: Exists
      containers:
        - name: tunnel-edge
          image: {{ tunnel_edge_image }}
          command:
            - /usr/local/bin/tunnel
          args:
            - --m=edge
            - --c=/etc/tunnel/conf/tunnel_edge.toml
          env:
            - name: MASTER_PUBLIC_ADDR
              value: "{{ master_public_addr }}:31000"
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
"#;
