//! Launch table for the built-in domain MCP servers.
//!
//! ChEMBL and UniProt ship as container images; the rest are Node
//! builds checked out under `mcp-servers/` in the workspace.

use crate::mcp::ServerParameters;

/// The built-in domain server table: (prompt id, launch parameters).
fn builtin_servers() -> Vec<(&'static str, ServerParameters)> {
    vec![
        (
            "agent.chembl",
            ServerParameters::new("docker", &["run", "-i", "chembl-mcp-server"]),
        ),
        (
            "agent.uniprot",
            ServerParameters::new("docker", &["run", "-i", "uniprot-mcp-server"]),
        ),
        (
            "agent.opentargets",
            ServerParameters::new("node", &["mcp-servers/OpenTargets-MCP-Server/build/index.js"]),
        ),
        (
            "agent.reactome",
            ServerParameters::new("node", &["mcp-servers/Reactome-MCP-Server/build/index.js"]),
        ),
        (
            "agent.string-db",
            ServerParameters::new("node", &["mcp-servers/STRING-db-MCP-Server/build/index.js"]),
        ),
        (
            "agent.gene-ontology",
            ServerParameters::new("node", &["mcp-servers/GeneOntology-MCP-Server/build/index.js"]),
        ),
        (
            "agent.pubchem",
            ServerParameters::new("node", &["mcp-servers/PubChem-MCP-Server/build/index.js"]),
        ),
        (
            "agent.pdb",
            ServerParameters::new("node", &["mcp-servers/PDB-MCP-Server/build/index.js"]),
        ),
        (
            "agent.protein-atlas",
            ServerParameters::new("node", &["mcp-servers/ProteinAtlas-MCP-Server/build/index.js"]),
        ),
    ]
}

/// Launch parameters for a domain, by prompt id.
pub fn server_for(id: &str) -> Option<ServerParameters> {
    builtin_servers()
        .into_iter()
        .find(|(server_id, _)| *server_id == id)
        .map(|(_, params)| params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_prompt_domain_has_a_server() {
        for id in labchat_prompt::builtin_ids() {
            assert!(server_for(id).is_some(), "no server for {}", id);
        }
    }

    #[test]
    fn test_container_domains_use_docker() {
        let params = server_for("agent.chembl").unwrap();
        assert_eq!(params.command, "docker");
        assert_eq!(params.args, vec!["run", "-i", "chembl-mcp-server"]);
    }

    #[test]
    fn test_node_domains_point_at_build_output() {
        let params = server_for("agent.pdb").unwrap();
        assert_eq!(params.command, "node");
        assert!(params.args[0].ends_with("PDB-MCP-Server/build/index.js"));
    }

    #[test]
    fn test_unknown_domain() {
        assert!(server_for("agent.unknown").is_none());
    }
}
