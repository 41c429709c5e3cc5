//! Starter file contents written by `--generate-config`.

/// User configuration file template
pub const ENV_TEMPLATE: &str = r#"# docker-ctp configuration
# Generated by docker-ctp --generate-config
#
# Values here are overridden by environment variables, which are in turn
# overridden by command-line flags.

# Target registry: "docker" (Docker Hub) or "github" (ghcr.io)
REGISTRY="docker"

# Registry account names
DOCKER_USERNAME="your-dockerhub-username"
GITHUB_USERNAME="your-github-username"

# Directory containing the Dockerfile (build context)
DOCKERFILE_DIR="."

# Image name; derived from the Dockerfile directory name when unset
# IMAGE_NAME="my-app"
# DYNAMIC_IMAGE_NAME=true

# Explicit tag; otherwise the registry default below is used
# IMAGE_TAG="v1.0.0"
DEFAULT_DOCKERHUB_TAG="latest"
DEFAULT_GITHUB_TAG="main"

# Registry tokens (personal access tokens are preferred over passwords)
# DOCKER_TOKEN="your-docker-hub-access-token"
# DOCKER_PASSWORD="your-docker-hub-password"
# GITHUB_TOKEN="your-github-personal-access-token"
# GHCR_TOKEN="your-github-personal-access-token"

# Behaviour
# USE_CACHE=true
# FORCE_REBUILD=false
# DRY_RUN=false
# CLEANUP_ON_EXIT=true
# LOG_LEVEL="normal"  # quiet, normal or verbose
"#;

/// Project ignore file template
pub const DOCKERIGNORE_TEMPLATE: &str = r#"# docker-ctp starter .dockerignore
# Generated by docker-ctp --generate-config

# Version control
.git
.gitignore
.gitattributes

# Editors
.vscode
.idea
*.swp
*.swo
*~

# OS files
.DS_Store
._*
Thumbs.db
ehthumbs.db

# Logs and temporary files
*.log
logs/
*.tmp
*.temp

# Node.js
node_modules/
npm-debug.log*
yarn-debug.log*
yarn-error.log*

# Documentation
README*
*.md
docs/

# Tests
test/
tests/
coverage/

# Build output (uncomment as needed)
# build/
# dist/
# target/

# Environment files
.env
.env.*
"#;
