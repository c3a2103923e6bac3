//! Post-generation package manifest repair
//!
//! The generators leave both package.json files pointing at their own demo
//! scripts and dependency sets. The `scripts` and `devDependencies` keys are
//! replaced outright rather than merged, so a re-run always converges to the
//! same known-good manifest. A manifest that cannot be read or parsed leaves
//! the workspace unusable, which is why failures here are fatal to the run.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tokio::fs;

fn infra_scripts(app_code: &str) -> Value {
    json!({
        "codegen": "cd api && npx @aws-amplify/cli codegen && cd ../frontend && npx @aws-amplify/cli codegen",
        "deploy:fe": format!("cdk deploy {}-FE-Hosting", app_code),
        "dev:api": format!("node api/build.mjs && npx aws-cdk deploy D{}-API -e true --hotswap true --require-approval never", app_code),
        "dev:fullstack": "node api/build.mjs && npx aws-cdk deploy D* --require-approval never --outputs-file ./frontend/amplifyconfiguration.json",
        "postdev:fullstack": "npx ts-node --prefer-ts-exts bin/frontend.ts",
        "build": "tsc",
        "watch": "tsc -w",
        "test": "jest",
        "cdk": "cdk",
    })
}

fn infra_dev_dependencies() -> Value {
    json!({
        "aws-cdk": "2.163.1",
        "esbuild": "^0.21.5",
        "esbuild-plugin-eslint": "^0.3.12",
        "glob": "^10.4.2",
        "jest": "^29.7.0",
        "ts-jest": "^29.2.5",
        "ts-node": "^10.9.2",
        "typescript": "~5.6.2",
        "aws-amplify": "^6.4.3",
        "aws-sdk-client-mock": "^4.0.1",
        "@aws-cdk/aws-amplify-alpha": "^2.147.1-alpha.0",
        "@aws-appsync/utils": "^1.8.0",
        "@aws-sdk/client-cognito-identity-provider": "^3.654.0",
        "@aws-sdk/client-dynamodb": "^3.602.0",
        "@aws-sdk/client-sesv2": "^3.600.0",
        "@aws-sdk/client-sqs": "^3.651.1",
        "@aws-sdk/client-appsync": "^3.600.0",
        "@aws-sdk/client-cloudformation": "^3.609.0",
        "@types/jest": "^29.5.12",
        "@types/node": "22.5.4",
    })
}

fn frontend_scripts(app_code: &str) -> Value {
    json!({
        "dev": "RESOURCE_PREFIX=D next dev --turbo",
        "build:frontend": "next build",
        "start": "next start",
        "lint": "eslint . --ext .ts,.tsx -c .eslintrc.json --fix",
        "codegen:api": "cd backend/api && npx @aws-amplify/cli codegen",
        "deploy:api": format!("cd backend && npx aws-cdk deploy D{}-API-DB --require-approval never", app_code),
        "predeploy:api": "node backend/api/build.mjs",
    })
}

/// Rewrite the infrastructure manifest at `<workspace>/package.json`:
/// `scripts` and `devDependencies` are replaced with the fixed tables.
pub async fn patch_infra(workspace: &Path, app_code: &str) -> Result<()> {
    let path = workspace.join("package.json");
    apply(&path, |doc| {
        doc.insert("scripts".to_string(), infra_scripts(app_code));
        doc.insert("devDependencies".to_string(), infra_dev_dependencies());
    })
    .await
}

/// Rewrite the frontend manifest at `<workspace>/frontend/package.json`:
/// only `scripts` is replaced.
pub async fn patch_frontend(workspace: &Path, app_code: &str) -> Result<()> {
    let path = workspace.join("frontend").join("package.json");
    apply(&path, |doc| {
        doc.insert("scripts".to_string(), frontend_scripts(app_code));
    })
    .await
}

async fn apply<F>(path: &Path, patch: F) -> Result<()>
where
    F: FnOnce(&mut Map<String, Value>),
{
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
    let object = doc
        .as_object_mut()
        .with_context(|| format!("Manifest {} is not a JSON object", path.display()))?;
    patch(object);

    // Stable 2-space indentation, same shape every run.
    let serialized = serde_json::to_string_pretty(&doc)
        .with_context(|| format!("Failed to serialize manifest {}", path.display()))?;
    fs::write(path, serialized)
        .await
        .with_context(|| format!("Failed to write manifest {}", path.display()))
}
