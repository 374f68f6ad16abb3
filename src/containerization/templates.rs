//! Text generators for container artifacts
//!
//! One Dockerfile generator per strategy. Compose files are built as JSON values and
//! rendered through `serde_yaml` so quoting is always valid.

use super::strategy::DockerfileStrategy;
use crate::detection::ProjectProfile;
use serde_json::json;

const DOCKERIGNORE: &str = "\
# dependencies
node_modules/
vendor/
.venv/
__pycache__/
target/
npm-debug.log*
yarn-error.log*

# build output
dist/
build/
.next/
.nuxt/
.output/
coverage/

# local environment
.env
.env.*
*.log

# editors and OS
.vscode/
.idea/
*.swp
.DS_Store
Thumbs.db

# version control and container files
.git/
.gitignore
Dockerfile*
docker-compose*
.dockerignore
";

fn healthcheck(profile: &ProjectProfile) -> String {
    format!(
        "HEALTHCHECK --interval={} --timeout=3s --start-period=5s --retries={} \\\n    CMD {}\n",
        profile.health_check.interval, profile.health_check.retries, profile.health_check.test
    )
}

fn env_lines(profile: &ProjectProfile) -> String {
    let mut lines = String::new();
    for (name, value) in &profile.environment_vars {
        if name == "PORT" {
            continue;
        }
        lines.push_str(&format!("ENV {}={}\n", name, value));
    }
    lines.push_str(&format!("ENV PORT={}\n", profile.port));
    lines
}

fn node_install(profile: &ProjectProfile) -> &'static str {
    match profile.package_manager.as_deref() {
        Some("yarn") => "yarn install --frozen-lockfile",
        Some("pnpm") => "corepack enable && pnpm install --frozen-lockfile",
        _ => "npm ci",
    }
}

fn node_build(profile: &ProjectProfile) -> &str {
    profile.build_command.as_deref().unwrap_or("npm run build")
}

/// Node build stage, nginx runtime serving `output_dir`
pub fn multi_stage_build(profile: &ProjectProfile, output_dir: &str) -> String {
    format!(
        "FROM {base} AS builder\n\
         WORKDIR /app\n\
         COPY package*.json yarn.lock* pnpm-lock.yaml* ./\n\
         RUN {install}\n\
         COPY . .\n\
         RUN {build}\n\
         \n\
         FROM nginx:alpine\n\
         RUN apk add --no-cache curl\n\
         COPY --from=builder /app/{output} /usr/share/nginx/html\n\
         COPY nginx.conf /etc/nginx/nginx.conf\n\
         EXPOSE {port}\n\
         {health}\
         CMD [\"nginx\", \"-g\", \"daemon off;\"]\n",
        base = profile.base_image,
        install = node_install(profile),
        build = node_build(profile),
        output = output_dir.trim_matches('/'),
        port = profile.port,
        health = healthcheck(profile),
    )
}

/// Standalone Next.js server running as an unprivileged user
pub fn nextjs_optimized(profile: &ProjectProfile) -> String {
    format!(
        "FROM {base} AS deps\n\
         RUN apk add --no-cache libc6-compat\n\
         WORKDIR /app\n\
         COPY package*.json yarn.lock* pnpm-lock.yaml* ./\n\
         RUN {install}\n\
         \n\
         FROM {base} AS builder\n\
         WORKDIR /app\n\
         COPY --from=deps /app/node_modules ./node_modules\n\
         COPY . .\n\
         RUN {build}\n\
         \n\
         FROM {base} AS runner\n\
         WORKDIR /app\n\
         {env}\
         ENV HOSTNAME=0.0.0.0\n\
         RUN addgroup --system --gid 1001 nodejs && adduser --system --uid 1001 app\n\
         COPY --from=builder /app/public ./public\n\
         COPY --from=builder --chown=app:nodejs /app/.next/standalone ./\n\
         COPY --from=builder --chown=app:nodejs /app/.next/static ./.next/static\n\
         USER app\n\
         EXPOSE {port}\n\
         {health}\
         CMD [\"node\", \"server.js\"]\n",
        base = profile.base_image,
        install = node_install(profile),
        build = node_build(profile),
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

/// Nitro output server for Nuxt
pub fn nuxt_optimized(profile: &ProjectProfile) -> String {
    format!(
        "FROM {base} AS builder\n\
         WORKDIR /app\n\
         COPY package*.json yarn.lock* pnpm-lock.yaml* ./\n\
         RUN {install}\n\
         COPY . .\n\
         RUN {build}\n\
         \n\
         FROM {base} AS runner\n\
         WORKDIR /app\n\
         {env}\
         ENV HOST=0.0.0.0\n\
         RUN addgroup --system --gid 1001 nodejs && adduser --system --uid 1001 app\n\
         COPY --from=builder --chown=app:nodejs /app/.output ./.output\n\
         USER app\n\
         EXPOSE {port}\n\
         {health}\
         CMD [\"node\", \".output/server/index.mjs\"]\n",
        base = profile.base_image,
        install = node_install(profile),
        build = node_build(profile),
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn python_optimized(profile: &ProjectProfile) -> String {
    format!(
        "FROM {base} AS builder\n\
         WORKDIR /app\n\
         RUN apt-get update && apt-get install -y --no-install-recommends gcc && rm -rf /var/lib/apt/lists/*\n\
         COPY requirements.txt .\n\
         RUN pip install --no-cache-dir --user -r requirements.txt\n\
         \n\
         FROM {base}\n\
         WORKDIR /app\n\
         RUN apt-get update && apt-get install -y --no-install-recommends curl && rm -rf /var/lib/apt/lists/*\n\
         COPY --from=builder /root/.local /root/.local\n\
         COPY . .\n\
         ENV PATH=/root/.local/bin:$PATH\n\
         {env}\
         EXPOSE {port}\n\
         {health}\
         CMD [\"python\", \"main.py\"]\n",
        base = profile.base_image,
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn java_optimized(profile: &ProjectProfile) -> String {
    let gradle = profile.build_command.as_deref() == Some("./gradlew build");
    let (builder, sources, build, jar) = if gradle {
        (
            "gradle:8-jdk17",
            "COPY . .\n",
            "RUN ./gradlew build -x test",
            "/app/build/libs/*.jar",
        )
    } else {
        (
            "maven:3.9-eclipse-temurin-17",
            "COPY pom.xml .\nCOPY src ./src\n",
            "RUN mvn clean package -DskipTests",
            "/app/target/*.jar",
        )
    };

    format!(
        "FROM {builder} AS builder\n\
         WORKDIR /app\n\
         {sources}\
         {build}\n\
         \n\
         FROM {base}\n\
         WORKDIR /app\n\
         COPY --from=builder {jar} app.jar\n\
         {env}\
         EXPOSE {port}\n\
         {health}\
         CMD [\"sh\", \"-c\", \"java $JAVA_OPTS -jar app.jar\"]\n",
        builder = builder,
        sources = sources,
        build = build,
        base = profile.base_image,
        jar = jar,
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn go_optimized(profile: &ProjectProfile) -> String {
    format!(
        "FROM {base} AS builder\n\
         WORKDIR /app\n\
         COPY go.mod go.sum* ./\n\
         RUN go mod download\n\
         COPY . .\n\
         RUN CGO_ENABLED=0 GOOS=linux go build -o main .\n\
         \n\
         FROM alpine:3.19\n\
         RUN apk --no-cache add ca-certificates curl\n\
         WORKDIR /app\n\
         COPY --from=builder /app/main .\n\
         {env}\
         EXPOSE {port}\n\
         {health}\
         CMD [\"./main\"]\n",
        base = profile.base_image,
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn rust_optimized(profile: &ProjectProfile) -> String {
    format!(
        "FROM {base} AS builder\n\
         WORKDIR /app\n\
         COPY . .\n\
         RUN cargo build --release \\\n    && find target/release -maxdepth 1 -type f -perm -u+x -exec cp {{}} /app/server \\;\n\
         \n\
         FROM debian:bookworm-slim\n\
         RUN apt-get update && apt-get install -y --no-install-recommends ca-certificates curl && rm -rf /var/lib/apt/lists/*\n\
         WORKDIR /app\n\
         COPY --from=builder /app/server .\n\
         {env}\
         EXPOSE {port}\n\
         {health}\
         CMD [\"./server\"]\n",
        base = profile.base_image,
        env = env_lines(profile),
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn php_fpm(profile: &ProjectProfile) -> String {
    format!(
        "FROM composer:2 AS vendor\n\
         WORKDIR /app\n\
         COPY composer.json composer.lock* ./\n\
         RUN composer install --no-dev --no-scripts --optimize-autoloader\n\
         \n\
         FROM {base}\n\
         RUN apk add --no-cache nginx curl && docker-php-ext-install pdo pdo_mysql\n\
         WORKDIR /var/www/html\n\
         COPY . .\n\
         COPY --from=vendor /app/vendor ./vendor\n\
         EXPOSE {port}\n\
         {health}\
         CMD [\"sh\", \"-c\", \"php-fpm -D && nginx -g 'daemon off;'\"]\n",
        base = profile.base_image,
        port = profile.port,
        health = healthcheck(profile),
    )
}

pub fn static_site(profile: &ProjectProfile) -> String {
    format!(
        "FROM nginx:alpine\n\
         RUN apk add --no-cache curl\n\
         COPY . /usr/share/nginx/html\n\
         COPY nginx.conf /etc/nginx/nginx.conf\n\
         EXPOSE {port}\n\
         {health}\
         CMD [\"nginx\", \"-g\", \"daemon off;\"]\n",
        port = profile.port,
        health = healthcheck(profile),
    )
}

/// Single stage from the base image; used for `simple` and unrecognized strategies
pub fn generic(base_image: &str, port: u16) -> String {
    format!(
        "FROM {base}\n\
         WORKDIR /app\n\
         COPY . .\n\
         EXPOSE {port}\n\
         HEALTHCHECK --interval=30s --timeout=3s --start-period=5s --retries=3 \\\n    CMD curl -f http://localhost:{port}/ || exit 1\n\
         CMD [\"sh\", \"-c\", \"echo 'No start command configured' && exit 1\"]\n",
        base = base_image,
        port = port,
    )
}

/// Generator lookup keyed by strategy
pub fn render_dockerfile(strategy: &DockerfileStrategy, profile: &ProjectProfile, output_dir: &str) -> String {
    match strategy {
        DockerfileStrategy::MultiStageBuild => multi_stage_build(profile, output_dir),
        DockerfileStrategy::NextjsOptimized => nextjs_optimized(profile),
        DockerfileStrategy::NuxtOptimized => nuxt_optimized(profile),
        DockerfileStrategy::PythonOptimized => python_optimized(profile),
        DockerfileStrategy::JavaOptimized => java_optimized(profile),
        DockerfileStrategy::GoOptimized => go_optimized(profile),
        DockerfileStrategy::RustOptimized => rust_optimized(profile),
        DockerfileStrategy::PhpFpm => php_fpm(profile),
        DockerfileStrategy::StaticSite => static_site(profile),
        DockerfileStrategy::Simple | DockerfileStrategy::Custom(_) => {
            generic(&profile.base_image, profile.port)
        }
    }
}

pub fn nginx_conf(port: u16) -> String {
    format!(
        "worker_processes auto;\n\
         events {{ worker_connections 1024; }}\n\
         \n\
         http {{\n    \
             include /etc/nginx/mime.types;\n    \
             default_type application/octet-stream;\n    \
             sendfile on;\n    \
             gzip on;\n    \
             gzip_types text/css application/javascript application/json image/svg+xml;\n\
         \n    \
             server {{\n        \
                 listen {port};\n        \
                 root /usr/share/nginx/html;\n        \
                 index index.html;\n\
         \n        \
                 location / {{\n            \
                     try_files $uri $uri/ /index.html;\n        \
                 }}\n\
         \n        \
                 location ~* \\.(js|css|png|jpg|jpeg|gif|svg|ico|woff2?)$ {{\n            \
                     expires 1y;\n            \
                     add_header Cache-Control \"public, immutable\";\n        \
                 }}\n    \
             }}\n\
         }}\n",
        port = port
    )
}

fn compose_value(profile: &ProjectProfile, production: bool) -> serde_json::Value {
    let port_mapping = format!("{0}:{0}", profile.port);
    let mut environment: Vec<String> = profile
        .environment_vars
        .iter()
        .filter(|(k, _)| k.as_str() != "PORT" && k.as_str() != "NODE_ENV")
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    environment.push(format!("PORT={}", profile.port));
    if profile.project_type.is_frontend() {
        let mode = if production { "production" } else { "development" };
        environment.push(format!("NODE_ENV={}", mode));
    }

    let healthcheck = json!({
        "test": ["CMD-SHELL", profile.health_check.test],
        "interval": profile.health_check.interval,
        "timeout": profile.health_check.timeout,
        "retries": profile.health_check.retries,
        "start_period": "40s",
    });

    let mut app = json!({
        "build": ".",
        "image": format!("{}-app:latest", profile.project_type),
        "ports": [port_mapping],
        "environment": environment,
        "restart": "unless-stopped",
        "healthcheck": healthcheck,
    });

    if production {
        app["deploy"] = json!({
            "resources": {
                "limits": { "memory": "512M" },
                "reservations": { "memory": "256M" },
            }
        });
    } else {
        app["volumes"] = json!([".:/app"]);
    }

    let network = if production {
        format!("{}-prod-network", profile.project_type)
    } else {
        format!("{}-network", profile.project_type)
    };

    json!({
        "services": { "app": app },
        "networks": { "default": { "name": network } },
    })
}

pub fn compose(profile: &ProjectProfile, production: bool) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&compose_value(profile, production))
}

pub fn dockerignore() -> &'static str {
    DOCKERIGNORE
}
